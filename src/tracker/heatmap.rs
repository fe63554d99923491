use chrono::{Datelike, Days, Duration, NaiveDate};

use crate::store::entities::Session;

use super::stats::daily_totals;

pub const DEFAULT_HEAT_WEEKS: usize = 12;

/// One day of the heat map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub minutes: i64,
    pub level: u8,
}

/// Buckets a day's total minutes into an intensity level 0..=4.
pub fn heat_level(minutes: i64) -> u8 {
    if minutes > 120 {
        4
    } else if minutes > 60 {
        3
    } else if minutes > 30 {
        2
    } else if minutes > 0 {
        1
    } else {
        0
    }
}

/// A day's total rounded to whole minutes.
pub fn day_minutes(total: Duration) -> i64 {
    (total.num_milliseconds() as f64 / 60_000.).round() as i64
}

/// Github-style activity grid: `weeks` columns of Sunday..Saturday rows,
/// today in the last column. Cells past today are None.
pub fn heat_map(
    sessions: &[Session],
    weeks: usize,
    today: NaiveDate,
) -> Vec<Vec<Option<DayCell>>> {
    let totals = daily_totals(sessions);
    let day_of_week = today.weekday().num_days_from_sunday() as i64;
    let total_days = weeks as i64 * 7;
    let start_offset = total_days - 1 - day_of_week;

    (0..weeks as i64)
        .map(|week| {
            (0..7i64)
                .map(|day| {
                    let days_ago = start_offset - week * 7 - day;
                    if days_ago < 0 {
                        return None;
                    }
                    let date = today - Days::new(days_ago as u64);
                    let minutes = totals
                        .get(&date)
                        .map(|total| day_minutes(*total))
                        .unwrap_or(0);
                    Some(DayCell {
                        date,
                        minutes,
                        level: heat_level(minutes),
                    })
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone, Weekday};

    use crate::store::entities::Session;

    use super::{heat_level, heat_map, DEFAULT_HEAT_WEEKS};

    #[test]
    fn test_heat_level_boundaries() {
        for (minutes, level) in [
            (0, 0),
            (1, 1),
            (30, 1),
            (31, 2),
            (60, 2),
            (61, 3),
            (120, 3),
            (121, 4),
        ] {
            assert_eq!(heat_level(minutes), level, "{minutes} minutes");
        }
    }

    #[test]
    fn test_grid_shape_and_future_padding() {
        // A Wednesday: three trailing cells of the last column lie in the
        // future.
        let today = NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();
        let grid = heat_map(&[], DEFAULT_HEAT_WEEKS, today);

        assert_eq!(grid.len(), DEFAULT_HEAT_WEEKS);
        assert!(grid.iter().all(|week| week.len() == 7));

        let last_week = &grid[DEFAULT_HEAT_WEEKS - 1];
        assert_eq!(last_week[3].unwrap().date, today);
        assert!(last_week[4].is_none());
        assert!(last_week[6].is_none());

        // Each column starts on a Sunday.
        for week in &grid {
            if let Some(cell) = week[0] {
                assert_eq!(cell.date.weekday(), Weekday::Sun);
            }
        }
    }

    #[test]
    fn test_sessions_color_their_day() {
        let start = Local.with_ymd_and_hms(2025, 6, 17, 9, 0, 0).unwrap().to_utc();
        let sessions = vec![Session::closed(start, start + Duration::minutes(45))];

        let today = NaiveDate::from_ymd_opt(2025, 6, 18).unwrap();
        let grid = heat_map(&sessions, DEFAULT_HEAT_WEEKS, today);

        // The 17th is a Tuesday, row 2 of the last column.
        let cell = grid[DEFAULT_HEAT_WEEKS - 1][2].unwrap();
        assert_eq!(cell.date, NaiveDate::from_ymd_opt(2025, 6, 17).unwrap());
        assert_eq!(cell.minutes, 45);
        assert_eq!(cell.level, 2);
    }
}
