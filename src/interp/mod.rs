//! Temporal disaggregation: periodic observations → dense daily series.
//!
//! Responsibilities:
//!
//! - group observations into date-ordered per-category series
//! - build a `{base, rate}` segment table per category (`linear`)
//! - materialize one value per day over the run's date grid

pub mod linear;

pub use linear::*;

use std::collections::BTreeMap;

use crate::domain::{CategorySeries, PeriodicObservation};
use crate::error::{SeriesKind, UnitError};

/// Daily series for every category that could be interpolated.
#[derive(Debug, Clone, Default)]
pub struct DailySet {
    pub series: BTreeMap<String, DailySeries>,
    /// Categories that could not be interpolated, and why.
    pub failures: Vec<UnitError>,
}

impl DailySet {
    pub fn get(&self, category: &str) -> Option<&DailySeries> {
        self.series.get(category)
    }
}

/// Split observations into per-category series sorted by date.
///
/// Categories come back in lexical order so downstream output is stable.
pub fn group_by_category(observations: &[PeriodicObservation]) -> Vec<CategorySeries> {
    let mut grouped: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for obs in observations {
        grouped
            .entry(obs.category.as_str())
            .or_default()
            .push((obs.date, obs.value));
    }

    grouped
        .into_iter()
        .map(|(category, mut points)| {
            points.sort_by_key(|(date, _)| *date);
            CategorySeries {
                category: category.to_string(),
                points,
            }
        })
        .collect()
}

/// Interpolate every category of `observations` onto the days of `grid`.
///
/// A category that fails (fewer than 2 points, duplicate dates) is reported in
/// `failures` and left out; the others are unaffected.
pub fn interpolate_daily(
    observations: &[PeriodicObservation],
    kind: SeriesKind,
    grid: DateRange,
) -> DailySet {
    let mut out = DailySet::default();
    for series in group_by_category(observations) {
        match InterpolationTable::build(&series, kind) {
            Ok(table) => {
                let daily = table.densify(grid);
                if daily.is_empty() {
                    log::warn!("{kind} for '{}' has no day inside the run grid", series.category);
                }
                log::debug!(
                    "interpolated {kind} for '{}': {} day(s) from {}",
                    series.category,
                    daily.values.len(),
                    daily.start
                );
                out.series.insert(series.category, daily);
            }
            Err(err) => {
                log::warn!("{err}");
                out.failures.push(err);
            }
        }
    }
    out
}
