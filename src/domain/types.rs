//! Shared domain types.
//!
//! Input records arrive already typed from the ingest boundary; everything
//! downstream of them is derived once and never mutated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default first year of the regression baseline window.
pub const DEFAULT_BASELINE_START: i32 = 2013;
/// Default last year of the regression baseline window.
pub const DEFAULT_BASELINE_END: i32 = 2019;
/// Default number of years searched on each side of a target date.
pub const DEFAULT_ANCHOR_YEARS: i32 = 12;
/// Default approximate year length (days) used to step between seasons.
pub const DEFAULT_DAY_STEP: f64 = 365.25;
/// Largest accepted anchor span (years on each side).
pub const MAX_ANCHOR_YEARS: i32 = 100;
/// Largest accepted season step in days.
pub const MAX_DAY_STEP: f64 = 400.0;

/// One week of deaths for one age category, anchored at the week midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathObservation {
    pub week_midpoint: NaiveDate,
    pub category: String,
    /// Average deaths per day over the week.
    pub daily_deaths: f64,
}

/// One quarterly population estimate for one age category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationObservation {
    pub quarter_end: NaiveDate,
    pub category: String,
    pub population: f64,
}

/// A periodic value at its representative date.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicObservation {
    pub category: String,
    pub date: NaiveDate,
    pub value: f64,
}

impl From<&DeathObservation> for PeriodicObservation {
    fn from(obs: &DeathObservation) -> Self {
        Self {
            category: obs.category.clone(),
            date: obs.week_midpoint,
            value: obs.daily_deaths,
        }
    }
}

impl From<&PopulationObservation> for PeriodicObservation {
    fn from(obs: &PopulationObservation) -> Self {
        Self {
            category: obs.category.clone(),
            date: obs.quarter_end,
            value: obs.population,
        }
    }
}

/// Date-ordered observations of a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Joined deaths and population for one `(date, category)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub category: String,
    pub deaths: f64,
    pub population: f64,
}

/// One row of the ASM component table.
///
/// `percapita` and `asm_contribution` are `None` when the population is zero or
/// missing; they are never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsmComponent {
    pub date: NaiveDate,
    pub category: String,
    pub deaths: f64,
    pub population: f64,
    pub percapita: Option<f64>,
    pub standard_population: f64,
    pub asm_contribution: Option<f64>,
}

/// Category-summed daily values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub raw_deaths: f64,
    pub raw_population: f64,
    pub asm: f64,
    pub asmr: f64,
    /// Number of categories that contributed a valid ASM value on this date.
    pub categories: usize,
}

/// Fitted seasonal trend for one target date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpectedRecord {
    pub date: NaiveDate,
    pub intercept: f64,
    pub slope: f64,
    pub expected: f64,
    /// Baseline points used by the fit.
    pub points: usize,
}

/// One row of the actual-vs-expected table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActualVsExpected {
    pub date: NaiveDate,
    pub raw_deaths: f64,
    pub raw_population: f64,
    pub asm: f64,
    pub asmr: f64,
    pub intercept: Option<f64>,
    pub slope: Option<f64>,
    pub expected_asm: Option<f64>,
    pub expected_asmr: Option<f64>,
    pub excess_asm: Option<f64>,
}

/// Baseline window used by the seasonal regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineConfig {
    pub start_year: i32,
    pub end_year: i32,
    /// Candidate offsets are `k` years for `k` in `[-anchor_years, anchor_years]`.
    pub anchor_years: i32,
    /// Approximate days per year used to step between candidates.
    pub day_step: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            start_year: DEFAULT_BASELINE_START,
            end_year: DEFAULT_BASELINE_END,
            anchor_years: DEFAULT_ANCHOR_YEARS,
            day_step: DEFAULT_DAY_STEP,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    pub baseline: BaselineConfig,
    /// Reference population snapshot; `None` means the latest available.
    pub reference_date: Option<NaiveDate>,
    /// Restrict expected values to dates on or after this one.
    pub output_from: Option<NaiveDate>,
    /// Restrict expected values to dates on or before this one.
    pub output_to: Option<NaiveDate>,
    /// Extra inclusive period to summarize excess over.
    pub excess_period: Option<(NaiveDate, NaiveDate)>,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        let b = &self.baseline;
        if b.start_year > b.end_year {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid baseline range: start year {} is after end year {}.",
                    b.start_year, b.end_year
                ),
            ));
        }
        if !(b.day_step.is_finite() && b.day_step > 0.0 && b.day_step <= MAX_DAY_STEP) {
            return Err(AppError::new(
                2,
                format!("Invalid day step {} (must be finite, > 0 and <= {MAX_DAY_STEP}).", b.day_step),
            ));
        }
        if !(0..=MAX_ANCHOR_YEARS).contains(&b.anchor_years) {
            return Err(AppError::new(
                2,
                format!("Invalid anchor span {} (must be in 0..={MAX_ANCHOR_YEARS}).", b.anchor_years),
            ));
        }
        if let (Some(from), Some(to)) = (self.output_from, self.output_to) {
            if from > to {
                return Err(AppError::new(
                    2,
                    format!("Invalid output window: {from} is after {to}."),
                ));
            }
        }
        if let Some((from, to)) = self.excess_period {
            if from > to {
                return Err(AppError::new(
                    2,
                    format!("Invalid excess period: {from} is after {to}."),
                ));
            }
        }
        Ok(())
    }

    pub fn in_output_window(&self, date: NaiveDate) -> bool {
        self.output_from.is_none_or(|from| date >= from) && self.output_to.is_none_or(|to| date <= to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.baseline.start_year, 2013);
        assert_eq!(config.baseline.end_year, 2019);
        assert_eq!(config.baseline.anchor_years, 12);
    }

    #[test]
    fn rejects_inverted_baseline_and_bad_step() {
        let mut config = PipelineConfig::default();
        config.baseline.start_year = 2020;
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);

        let mut config = PipelineConfig::default();
        config.baseline.day_step = f64::NAN;
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            output_from: Some(d(2021, 1, 1)),
            output_to: Some(d(2020, 1, 1)),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_day_step_and_anchor_span() {
        let mut config = PipelineConfig::default();
        config.baseline.day_step = 1e15;
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);

        let mut config = PipelineConfig::default();
        config.baseline.day_step = MAX_DAY_STEP;
        assert!(config.validate().is_ok());

        let mut config = PipelineConfig::default();
        config.baseline.anchor_years = MAX_ANCHOR_YEARS + 1;
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);

        let mut config = PipelineConfig::default();
        config.baseline.anchor_years = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn output_window_is_inclusive() {
        let config = PipelineConfig {
            output_from: Some(d(2020, 1, 1)),
            output_to: Some(d(2020, 12, 31)),
            ..PipelineConfig::default()
        };
        assert!(config.in_output_window(d(2020, 1, 1)));
        assert!(config.in_output_window(d(2020, 12, 31)));
        assert!(!config.in_output_window(d(2021, 1, 1)));
        assert!(PipelineConfig::default().in_output_window(d(1990, 1, 1)));
    }
}
