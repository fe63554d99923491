use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, Utc};
use now::DateTimeNow;

/// Formats a duration the way totals are displayed: "2d 4h", "2h 34m",
/// "5m 2s", "45s". Negative values collapse to "0s".
pub fn format_duration(v: Duration) -> String {
    let v = v.max(Duration::zero());
    let seconds = v.num_seconds();
    let minutes = v.num_minutes();
    let hours = v.num_hours();
    let days = v.num_days();

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

/// Live timer display: "02:34:56", or "34:56" while under an hour.
pub fn format_timer(v: Duration) -> String {
    let total = v.max(Duration::zero()).num_seconds();
    let hours = total / 3600;
    let minutes = total % 3600 / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// The week a moment falls in: Sunday 00:00:00.000 through Saturday
/// 23:59:59.999 local time.
pub fn week_range(now: DateTime<Local>) -> (DateTime<Local>, DateTime<Local>) {
    let start =
        (now - Duration::days(now.weekday().num_days_from_sunday() as i64)).beginning_of_day();
    let end = (start + Duration::days(6))
        .with_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap())
        .unwrap();
    (start, end)
}

/// Local calendar day a utc instant falls on. Totals and streaks group by
/// the user's calendar, not by utc days.
pub fn local_day(moment: DateTime<Utc>) -> NaiveDate {
    moment.with_timezone(&Local).date_naive()
}
