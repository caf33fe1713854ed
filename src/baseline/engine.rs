//! Per-date seasonal trend fits.
//!
//! Each target date is fitted on its own: select the season-matched baseline
//! points, regress ASM on the date ordinal, and evaluate the line at the
//! target. Nothing is carried between dates, so the batch is a plain parallel
//! map over the target dates.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::aggregate::AsmSeries;
use crate::baseline::candidates::baseline_points;
use crate::domain::{BaselineConfig, ExpectedRecord, ordinal};
use crate::error::UnitError;
use crate::math::fit_line;

/// Fit the seasonal trend for a single target date.
pub fn fit_expected(
    series: &AsmSeries,
    config: &BaselineConfig,
    target: NaiveDate,
) -> Result<ExpectedRecord, UnitError> {
    let points = baseline_points(target, config, series);
    let degenerate = || UnitError::DegenerateRegression {
        date: target,
        points: points.len(),
    };
    if points.len() < 2 {
        return Err(degenerate());
    }

    let xs: Vec<f64> = points.iter().map(|(date, _)| ordinal(*date) as f64).collect();
    let ys: Vec<f64> = points.iter().map(|(_, asm)| *asm).collect();
    let line = fit_line(&xs, &ys).ok_or_else(degenerate)?;

    let expected = line.predict(ordinal(target) as f64);
    if !expected.is_finite() {
        return Err(degenerate());
    }

    Ok(ExpectedRecord {
        date: target,
        intercept: line.intercept,
        slope: line.slope,
        expected,
        points: points.len(),
    })
}

/// Fit every target date in parallel; results keep the order of `targets`.
pub fn fit_expected_all(
    series: &AsmSeries,
    config: &BaselineConfig,
    targets: &[NaiveDate],
) -> Vec<Result<ExpectedRecord, UnitError>> {
    targets
        .par_iter()
        .map(|&target| fit_expected(series, config, target))
        .collect()
}
