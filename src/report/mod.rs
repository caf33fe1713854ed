//! Reporting: run audit trail, excess summaries, and terminal output.

pub mod excess;
pub mod format;

pub use excess::*;
pub use format::*;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::UnitError;

/// What a run computed and everything that failed along the way.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub grid_start: NaiveDate,
    pub grid_end: NaiveDate,
    pub reference_date: NaiveDate,
    pub reference_total: f64,
    pub reference_weights: BTreeMap<String, f64>,
    pub component_rows: usize,
    pub aggregate_days: usize,
    pub expected_days: usize,
    pub failure_counts: BTreeMap<&'static str, usize>,
    pub failures: Vec<UnitError>,
}

impl RunReport {
    /// Number of failures of one kind (see [`UnitError::kind_label`]).
    pub fn count(&self, kind: &str) -> usize {
        self.failure_counts.get(kind).copied().unwrap_or(0)
    }

    /// Join misses grouped by category.
    pub fn missing_joins_by_category(&self) -> BTreeMap<&str, usize> {
        let mut out = BTreeMap::new();
        for failure in &self.failures {
            if let UnitError::MissingJoin { category, .. } = failure {
                *out.entry(category.as_str()).or_insert(0) += 1;
            }
        }
        out
    }

    /// Categories removed from the run entirely.
    pub fn excluded_categories(&self) -> Vec<&UnitError> {
        self.failures.iter().filter(|f| f.is_category_fatal()).collect()
    }
}

/// Tally failures by kind.
pub fn count_by_kind(failures: &[UnitError]) -> BTreeMap<&'static str, usize> {
    let mut out = BTreeMap::new();
    for failure in failures {
        *out.entry(failure.kind_label()).or_insert(0) += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeriesKind;

    #[test]
    fn counts_and_groups_failures() {
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let failures = vec![
            UnitError::MissingJoin {
                date: day,
                category: "a".to_string(),
                present_in: SeriesKind::Deaths,
                missing_from: SeriesKind::Population,
            },
            UnitError::MissingJoin {
                date: day,
                category: "a".to_string(),
                present_in: SeriesKind::Population,
                missing_from: SeriesKind::Deaths,
            },
            UnitError::InsufficientData {
                series: SeriesKind::Deaths,
                category: "b".to_string(),
                observed: 0,
            },
        ];
        let report = RunReport {
            grid_start: day,
            grid_end: day,
            reference_date: day,
            reference_total: 1.0,
            reference_weights: BTreeMap::new(),
            component_rows: 0,
            aggregate_days: 0,
            expected_days: 0,
            failure_counts: count_by_kind(&failures),
            failures,
        };

        assert_eq!(report.count("missing_join"), 2);
        assert_eq!(report.count("degenerate_regression"), 0);
        assert_eq!(report.missing_joins_by_category().get("a"), Some(&2));
        assert_eq!(report.excluded_categories().len(), 1);
    }
}
