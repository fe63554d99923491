use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Days, Duration, Local, NaiveDate};

use crate::{
    store::entities::{Session, UserSettings},
    utils::{
        percentage::Percentage,
        time::{local_day, week_range},
    },
};

const MS_PER_DAY: f64 = 86_400_000.;

/// How far back the streak scan walks before giving up.
const STREAK_HORIZON_DAYS: u64 = 365;

/// Time tracked today: closed sessions whose start falls on the current
/// local calendar day, plus the open session's elapsed time.
pub fn today_total(sessions: &[Session], open_elapsed: Duration, now: DateTime<Local>) -> Duration {
    let today = now.date_naive();
    sessions
        .iter()
        .filter(|s| local_day(s.start_time) == today)
        .fold(open_elapsed, |total, s| total + s.duration)
}

/// Time tracked this week, Sunday through Saturday local, plus the open
/// session's elapsed time.
pub fn week_total(sessions: &[Session], open_elapsed: Duration, now: DateTime<Local>) -> Duration {
    let (start, end) = week_range(now);
    let (start, end) = (start.to_utc(), end.to_utc());
    sessions
        .iter()
        .filter(|s| s.start_time >= start && s.start_time <= end)
        .fold(open_elapsed, |total, s| total + s.duration)
}

/// Everything ever tracked, plus the open session's elapsed time.
pub fn all_time_total(sessions: &[Session], open_elapsed: Duration) -> Duration {
    sessions
        .iter()
        .fold(open_elapsed, |total, s| total + s.duration)
}

/// Tracked time expressed in days, exact real-valued division.
pub fn days_wasted(total: Duration) -> f64 {
    total.num_milliseconds() as f64 / MS_PER_DAY
}

/// Share of the user's statistically remaining lifespan the tracked time has
/// consumed. The remaining years are floored at one so an already-exceeded
/// life expectancy doesn't blow the division up. Not clamped here, displays
/// clamp.
pub fn life_percentage(
    total: Duration,
    settings: &UserSettings,
    current_year: i32,
) -> Percentage {
    let current_age = current_year - settings.birth_year;
    let remaining_years = (settings.life_expectancy - current_age).max(1);
    let remaining_ms = remaining_years as f64 * 365.25 * MS_PER_DAY;
    Percentage::new_opt(total.num_milliseconds() as f64 / remaining_ms * 100.)
        .expect("Percentage should always be at least 0")
}

/// Total tracked time per local calendar day.
pub fn daily_totals(sessions: &[Session]) -> HashMap<NaiveDate, Duration> {
    let mut totals = HashMap::new();
    for session in sessions {
        let day = local_day(session.start_time);
        let total = totals.entry(day).or_insert_with(Duration::zero);
        *total = *total + session.duration;
    }
    totals
}

/// Consecutive days with at least one session, walking backward from today.
/// An empty today doesn't break a streak that's still alive from yesterday,
/// the first empty day before that does.
pub fn current_streak(sessions: &[Session], today: NaiveDate) -> u32 {
    let active: HashSet<NaiveDate> = sessions.iter().map(|s| local_day(s.start_time)).collect();

    let mut streak = 0;
    for offset in 0..STREAK_HORIZON_DAYS {
        let day = today - Days::new(offset);
        if active.contains(&day) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}

/// Totals for the last seven days, oldest first, today last. The open
/// session's elapsed time counts toward today.
pub fn seven_day_series(
    sessions: &[Session],
    open_elapsed: Duration,
    now: DateTime<Local>,
) -> Vec<(NaiveDate, Duration)> {
    let totals = daily_totals(sessions);
    (0..7u64)
        .rev()
        .map(|back| {
            let day = now.date_naive() - Days::new(back);
            let mut total = totals.get(&day).copied().unwrap_or_else(Duration::zero);
            if back == 0 {
                total = total + open_elapsed;
            }
            (day, total)
        })
        .collect()
}

/// Aggregate numbers over the whole closed log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSummary {
    pub total_sessions: usize,
    pub total_time: Duration,
    pub average_session: Duration,
    pub longest_session: Duration,
    pub active_days: usize,
}

pub fn summarize(sessions: &[Session]) -> LogSummary {
    let total_sessions = sessions.len();
    let total_time = all_time_total(sessions, Duration::zero());
    let average_session = if total_sessions == 0 {
        Duration::zero()
    } else {
        total_time / total_sessions as i32
    };
    let longest_session = sessions
        .iter()
        .map(|s| s.duration)
        .max()
        .unwrap_or_else(Duration::zero);
    let active_days = sessions
        .iter()
        .map(|s| local_day(s.start_time))
        .collect::<HashSet<_>>()
        .len();

    LogSummary {
        total_sessions,
        total_time,
        average_session,
        longest_session,
        active_days,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Local, TimeZone};

    use crate::store::entities::{Session, UserSettings};

    use super::{
        all_time_total, current_streak, days_wasted, life_percentage, seven_day_series,
        summarize, today_total, week_total,
    };

    // 2025-06-18 is a Wednesday, mid-week so day arithmetic stays inside the
    // Sunday..Saturday range.
    fn test_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 18, 12, 0, 0).unwrap()
    }

    fn session_days_ago(days: i64, minutes: i64) -> Session {
        let start = (test_now() - Duration::days(days)).to_utc();
        Session::closed(start, start + Duration::minutes(minutes))
    }

    #[test]
    fn test_today_total_ignores_other_days() {
        let sessions = vec![session_days_ago(0, 30), session_days_ago(1, 45)];

        let total = today_total(&sessions, Duration::zero(), test_now());
        assert_eq!(total, Duration::minutes(30));

        // Appending yesterday's session changes nothing for today.
        let mut more = sessions.clone();
        more.push(session_days_ago(1, 90));
        assert_eq!(today_total(&more, Duration::zero(), test_now()), total);
    }

    #[test]
    fn test_open_session_counts_toward_totals() {
        let sessions = vec![session_days_ago(0, 30)];
        let open = Duration::minutes(10);

        assert_eq!(
            today_total(&sessions, open, test_now()),
            Duration::minutes(40)
        );
        assert_eq!(
            all_time_total(&sessions, open),
            Duration::minutes(40)
        );
    }

    #[test]
    fn test_week_total_is_bounded_by_sunday() {
        // Wednesday the 18th: Monday the 16th is inside the week, the
        // previous Saturday the 14th is not.
        let sessions = vec![
            session_days_ago(0, 30),
            session_days_ago(2, 45),
            session_days_ago(4, 60),
        ];
        assert_eq!(
            week_total(&sessions, Duration::zero(), test_now()),
            Duration::minutes(75)
        );
    }

    #[test]
    fn test_empty_log_yields_zeros() {
        assert_eq!(
            today_total(&[], Duration::zero(), test_now()),
            Duration::zero()
        );
        assert_eq!(all_time_total(&[], Duration::zero()), Duration::zero());
        assert_eq!(days_wasted(Duration::zero()), 0.);
        assert_eq!(
            *life_percentage(Duration::zero(), &UserSettings::default(), 2025),
            0.
        );
        assert_eq!(current_streak(&[], test_now().date_naive()), 0);
    }

    #[test]
    fn test_all_time_total_is_monotone_under_append() {
        let mut sessions = vec![];
        let mut previous = Duration::zero();
        for day in 0..5 {
            sessions.push(session_days_ago(day, 15));
            let total = all_time_total(&sessions, Duration::zero());
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn test_days_wasted_is_exact() {
        assert_eq!(days_wasted(Duration::hours(12)), 0.5);
        assert_eq!(days_wasted(Duration::days(3)), 3.);
    }

    #[test]
    fn test_life_percentage_end_to_end() {
        // Born 1995, expecting 80, in 2025: 50 years left. One tracked day
        // is about 0.005475% of them.
        let settings = UserSettings {
            birth_year: 1995,
            life_expectancy: 80,
        };
        let value = *life_percentage(Duration::days(1), &settings, 2025);
        assert!((value - 0.0054757).abs() < 1e-6, "got {value}");
    }

    #[test]
    fn test_life_percentage_is_monotone_in_time() {
        let settings = UserSettings::default();
        let mut previous = -1.;
        for hours in [0, 1, 24, 1000] {
            let value = *life_percentage(Duration::hours(hours), &settings, 2025);
            assert!(value > previous);
            previous = value;
        }
    }

    #[test]
    fn test_life_percentage_floors_remaining_years() {
        // Already past the declared expectancy: one year remains by fiat.
        let settings = UserSettings {
            birth_year: 1940,
            life_expectancy: 80,
        };
        let value = *life_percentage(Duration::days(1), &settings, 2025);
        assert!((value - 1. / 365.25 * 100.).abs() < 1e-9);
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        let sessions = vec![
            session_days_ago(0, 10),
            session_days_ago(1, 10),
            session_days_ago(2, 10),
        ];
        assert_eq!(current_streak(&sessions, test_now().date_naive()), 3);
    }

    #[test]
    fn test_streak_tolerates_an_empty_today() {
        let sessions = vec![session_days_ago(1, 10)];
        assert_eq!(current_streak(&sessions, test_now().date_naive()), 1);
    }

    #[test]
    fn test_streak_breaks_on_the_first_gap_before_today() {
        let sessions = vec![session_days_ago(2, 10)];
        assert_eq!(current_streak(&sessions, test_now().date_naive()), 0);

        let sessions = vec![session_days_ago(1, 10), session_days_ago(3, 10)];
        assert_eq!(current_streak(&sessions, test_now().date_naive()), 1);
    }

    #[test]
    fn test_seven_day_series_ends_today() {
        let sessions = vec![session_days_ago(0, 30), session_days_ago(6, 45)];
        let series = seven_day_series(&sessions, Duration::minutes(5), test_now());

        assert_eq!(series.len(), 7);
        assert_eq!(
            series[0],
            (test_now().date_naive() - Duration::days(6), Duration::minutes(45))
        );
        assert_eq!(series[6].0, test_now().date_naive());
        assert_eq!(series[6].1, Duration::minutes(35));
    }

    #[test]
    fn test_summarize() {
        let sessions = vec![
            session_days_ago(0, 10),
            session_days_ago(0, 30),
            session_days_ago(1, 20),
        ];
        let summary = summarize(&sessions);
        assert_eq!(summary.total_sessions, 3);
        assert_eq!(summary.total_time, Duration::minutes(60));
        assert_eq!(summary.average_session, Duration::minutes(20));
        assert_eq!(summary.longest_session, Duration::minutes(30));
        assert_eq!(summary.active_days, 2);
    }
}
