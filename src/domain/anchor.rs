//! Representative dates for periodic observations.
//!
//! Weekly counts are represented by their midpoint and quarterly estimates by
//! the last day of the quarter. Everything downstream compares these dates by
//! literal day counts, so week numbering (52 vs 53 ISO weeks) never enters the
//! arithmetic.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::AppError;

/// Days between the end of a reporting week and its representative midpoint.
pub const WEEK_MIDPOINT_OFFSET_DAYS: i64 = 4;

/// Midpoint date for a week ending on `week_end`.
pub fn week_midpoint(week_end: NaiveDate) -> NaiveDate {
    week_end - Duration::days(WEEK_MIDPOINT_OFFSET_DAYS)
}

/// Last day of quarter `quarter` (1–4) of `year`.
pub fn quarter_end(year: i32, quarter: u32) -> Result<NaiveDate, AppError> {
    let (month, day) = match quarter {
        1 => (3, 31),
        2 => (6, 30),
        3 => (9, 30),
        4 => (12, 31),
        _ => {
            return Err(AppError::new(
                2,
                format!("Invalid quarter {quarter} (expected 1-4)."),
            ));
        }
    };
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| AppError::new(2, format!("Invalid year {year} for quarter end.")))
}

/// Proleptic Gregorian ordinal, with 0001-01-01 as day 1.
pub fn ordinal(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn week_midpoint_is_four_days_before_end() {
        assert_eq!(week_midpoint(d(2020, 1, 5)), d(2020, 1, 1));
        assert_eq!(week_midpoint(d(2021, 3, 2)), d(2021, 2, 26));
    }

    #[test]
    fn quarter_ends() {
        assert_eq!(quarter_end(2020, 1).unwrap(), d(2020, 3, 31));
        assert_eq!(quarter_end(2020, 2).unwrap(), d(2020, 6, 30));
        assert_eq!(quarter_end(2020, 3).unwrap(), d(2020, 9, 30));
        assert_eq!(quarter_end(2020, 4).unwrap(), d(2020, 12, 31));
        assert!(quarter_end(2020, 5).is_err());
        assert!(quarter_end(2020, 0).is_err());
    }

    #[test]
    fn ordinal_counts_from_year_one() {
        assert_eq!(ordinal(d(1, 1, 1)), 1);
        assert_eq!(ordinal(d(2020, 1, 2)) - ordinal(d(2020, 1, 1)), 1);
        assert_eq!(ordinal(d(2021, 1, 1)) - ordinal(d(2020, 1, 1)), 366);
    }
}
