//! Season-matched candidate dates.
//!
//! For a target date `x`, the candidates are
//!
//! ```text
//! x + round(day_step * k)   for k in [-anchor_years, anchor_years]
//! ```
//!
//! With `day_step = 365.25` the accumulated leap-year drift stays within one
//! day over the whole span. `f64::round` rounds half away from zero, so the
//! offset for `-k` is always the negation of the offset for `k`.

use chrono::{Datelike, Duration, NaiveDate};

use crate::aggregate::AsmSeries;
use crate::domain::BaselineConfig;

/// Day offsets of every candidate, from most negative to most positive.
pub fn season_offsets(anchor_years: i32, day_step: f64) -> Vec<i64> {
    (-anchor_years..=anchor_years)
        .map(|k| (day_step * f64::from(k)).round() as i64)
        .collect()
}

/// Every candidate date for `target` (at most `2 * anchor_years + 1`).
///
/// Offsets that leave the representable date range are not candidates.
pub fn candidate_dates(target: NaiveDate, config: &BaselineConfig) -> Vec<NaiveDate> {
    season_offsets(config.anchor_years, config.day_step)
        .into_iter()
        .filter_map(|offset| Duration::try_days(offset).and_then(|delta| target.checked_add_signed(delta)))
        .collect()
}

/// Candidates inside the baseline years that exist in `series`, with their ASM.
///
/// A candidate missing from the series is a join miss and is simply skipped.
pub fn baseline_points(target: NaiveDate, config: &BaselineConfig, series: &AsmSeries) -> Vec<(NaiveDate, f64)> {
    candidate_dates(target, config)
        .into_iter()
        .filter(|date| (config.start_year..=config.end_year).contains(&date.year()))
        .filter_map(|date| series.get(date).map(|asm| (date, asm)))
        .collect()
}
