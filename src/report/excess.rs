//! Excess mortality over periods.
//!
//! Excess is actual minus expected ASM. A period summary only sums days that
//! have an expected value; days whose regression failed are counted separately
//! so a summary never silently treats them as zero excess.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::domain::ActualVsExpected;

/// Cumulative actual vs expected ASM over an inclusive date span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcessSummary {
    pub label: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Days with both an actual and an expected value.
    pub days: usize,
    /// Days in the span that had an actual value but no expected value.
    pub days_without_expected: usize,
    pub actual_asm: f64,
    pub expected_asm: f64,
    pub excess_asm: f64,
    /// Excess as a percentage of expected; `None` when expected is not positive.
    pub excess_pct: Option<f64>,
}

/// Summarize rows with `from <= date <= to`. Returns `None` when no row falls
/// in the span.
pub fn summarize_period(
    rows: &[ActualVsExpected],
    label: impl Into<String>,
    from: NaiveDate,
    to: NaiveDate,
) -> Option<ExcessSummary> {
    let in_span: Vec<&ActualVsExpected> = rows.iter().filter(|r| r.date >= from && r.date <= to).collect();
    if in_span.is_empty() {
        return None;
    }

    let mut days = 0;
    let mut actual_asm = 0.0;
    let mut expected_asm = 0.0;
    for row in &in_span {
        if let Some(expected) = row.expected_asm {
            days += 1;
            actual_asm += row.asm;
            expected_asm += expected;
        }
    }
    let excess_asm = actual_asm - expected_asm;

    Some(ExcessSummary {
        label: label.into(),
        from,
        to,
        days,
        days_without_expected: in_span.len() - days,
        actual_asm,
        expected_asm,
        excess_asm,
        excess_pct: (expected_asm > 0.0).then(|| 100.0 * excess_asm / expected_asm),
    })
}

/// One summary per calendar year present in `rows`.
pub fn summarize_by_year(rows: &[ActualVsExpected]) -> Vec<ExcessSummary> {
    let years: BTreeSet<i32> = rows.iter().map(|r| r.date.year()).collect();

    years
        .into_iter()
        .filter_map(|year| {
            let from = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let to = NaiveDate::from_ymd_opt(year, 12, 31)?;
            summarize_period(rows, year.to_string(), from, to)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(date: NaiveDate, asm: f64, expected: Option<f64>) -> ActualVsExpected {
        ActualVsExpected {
            date,
            raw_deaths: 0.0,
            raw_population: 0.0,
            asm,
            asmr: 0.0,
            intercept: expected.map(|_| 0.0),
            slope: expected.map(|_| 0.0),
            expected_asm: expected,
            expected_asmr: None,
            excess_asm: expected.map(|e| asm - e),
        }
    }

    #[test]
    fn period_sums_only_days_with_expected() {
        let rows = vec![
            row(d(2020, 4, 1), 110.0, Some(100.0)),
            row(d(2020, 4, 2), 120.0, Some(100.0)),
            row(d(2020, 4, 3), 500.0, None),
            row(d(2020, 5, 1), 90.0, Some(100.0)),
        ];
        let s = summarize_period(&rows, "april", d(2020, 4, 1), d(2020, 4, 30)).unwrap();
        assert_eq!(s.days, 2);
        assert_eq!(s.days_without_expected, 1);
        assert!((s.excess_asm - 30.0).abs() < 1e-12);
        assert!((s.excess_pct.unwrap() - 15.0).abs() < 1e-12);

        assert!(summarize_period(&rows, "none", d(2021, 1, 1), d(2021, 1, 31)).is_none());
    }

    #[test]
    fn yearly_summaries_are_ordered() {
        let rows = vec![
            row(d(2021, 1, 1), 105.0, Some(100.0)),
            row(d(2020, 6, 1), 95.0, Some(100.0)),
        ];
        let years = summarize_by_year(&rows);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].label, "2020");
        assert!((years[0].excess_asm + 5.0).abs() < 1e-12);
        assert_eq!(years[1].label, "2021");
    }

    #[test]
    fn no_percentage_without_expected() {
        let rows = vec![row(d(2020, 1, 1), 10.0, None)];
        let s = summarize_period(&rows, "x", d(2020, 1, 1), d(2020, 1, 1)).unwrap();
        assert_eq!(s.days, 0);
        assert_eq!(s.excess_pct, None);
    }
}
