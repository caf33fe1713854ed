//! Synthetic weekly deaths and quarterly population.
//!
//! Used by `asmr synth` / `asmr demo` and by tests that need realistic
//! multi-year inputs. Each category gets:
//!
//! - a population that grows (or shrinks) linearly, sampled at quarter ends
//! - a mortality rate with a winter peak (cosine over the day of year) and a
//!   slow annual trend
//! - multiplicative Gaussian noise on weekly counts
//! - an optional excess shock over a date span

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DeathObservation, PopulationObservation, quarter_end, week_midpoint};
use crate::error::AppError;

/// Shape of one synthetic age category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProfile {
    pub name: String,
    /// Population on 1 January of the first year.
    pub population: f64,
    /// Relative population change per year (e.g. `0.01` = +1%/y).
    pub population_growth: f64,
    /// Deaths per person per year, before seasonality.
    pub annual_mortality: f64,
    /// Relative change of the mortality rate per year (e.g. `-0.01`).
    pub mortality_trend: f64,
}

impl CategoryProfile {
    pub fn new(name: &str, population: f64, population_growth: f64, annual_mortality: f64, mortality_trend: f64) -> Self {
        Self {
            name: name.to_string(),
            population,
            population_growth,
            annual_mortality,
            mortality_trend,
        }
    }
}

/// Default five-band age structure.
pub fn default_profiles() -> Vec<CategoryProfile> {
    vec![
        CategoryProfile::new("0-44", 3_000_000.0, 0.004, 0.0006, -0.010),
        CategoryProfile::new("45-64", 1_400_000.0, 0.006, 0.0045, -0.012),
        CategoryProfile::new("65-74", 550_000.0, 0.020, 0.0160, -0.015),
        CategoryProfile::new("75-84", 330_000.0, 0.025, 0.0450, -0.015),
        CategoryProfile::new("85+", 120_000.0, 0.030, 0.1400, -0.010),
    ]
}

/// A temporary multiplicative rise in mortality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExcessShock {
    pub start: NaiveDate,
    pub days: i64,
    /// Peak multiplier applied at the middle of the span (e.g. `1.3`).
    pub peak: f64,
}

impl ExcessShock {
    /// Multiplier on `date`: a triangle rising to `peak` at mid-span.
    pub fn factor(&self, date: NaiveDate) -> f64 {
        let offset = (date - self.start).num_days();
        if self.days <= 0 || offset < 0 || offset > self.days {
            return 1.0;
        }
        let half = self.days as f64 / 2.0;
        let closeness = 1.0 - ((offset as f64 - half).abs() / half);
        1.0 + (self.peak - 1.0) * closeness
    }
}

/// Generator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub start_year: i32,
    pub end_year: i32,
    pub seed: u64,
    pub profiles: Vec<CategoryProfile>,
    /// Peak-to-mean winter amplitude of mortality (e.g. `0.15`).
    pub seasonal_amplitude: f64,
    /// Relative standard deviation of weekly noise.
    pub noise: f64,
    pub shock: Option<ExcessShock>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            start_year: 2010,
            end_year: 2023,
            seed: 42,
            profiles: default_profiles(),
            seasonal_amplitude: 0.15,
            noise: 0.03,
            shock: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub deaths: Vec<DeathObservation>,
    pub population: Vec<PopulationObservation>,
}

pub fn generate(config: &SynthConfig) -> Result<SyntheticData, AppError> {
    if config.start_year > config.end_year {
        return Err(AppError::new(2, "Synthetic start year must not be after end year."));
    }
    if config.profiles.is_empty() {
        return Err(AppError::new(2, "At least one synthetic category is required."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Invalid noise level."));
    }
    if !(config.seasonal_amplitude.is_finite() && config.seasonal_amplitude.abs() < 1.0) {
        return Err(AppError::new(2, "Seasonal amplitude must be in (-1, 1)."));
    }

    let first_day = NaiveDate::from_ymd_opt(config.start_year, 1, 1)
        .ok_or_else(|| AppError::new(2, "Invalid synthetic start year."))?;
    let last_day = NaiveDate::from_ymd_opt(config.end_year, 12, 31)
        .ok_or_else(|| AppError::new(2, "Invalid synthetic end year."))?;

    let mut rng = StdRng::seed_from_u64(mix_seed(config));
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut population = Vec::new();
    for year in config.start_year..=config.end_year {
        for quarter in 1..=4 {
            let date = quarter_end(year, quarter)?;
            for profile in &config.profiles {
                population.push(PopulationObservation {
                    quarter_end: date,
                    category: profile.name.clone(),
                    population: population_on(profile, first_day, date).round(),
                });
            }
        }
    }

    // Weeks end on Sunday; the first week is the first one ending in range.
    let mut week_end = first_day;
    while week_end.weekday() != Weekday::Sun {
        week_end += Duration::days(1);
    }

    let mut deaths = Vec::new();
    while week_end <= last_day {
        let midpoint = week_midpoint(week_end);
        for profile in &config.profiles {
            let people = population_on(profile, first_day, midpoint);
            let expected = people * daily_rate(profile, config, first_day, midpoint);
            let noisy = expected * (1.0 + normal.sample(&mut rng)).max(0.0);
            deaths.push(DeathObservation {
                week_midpoint: midpoint,
                category: profile.name.clone(),
                daily_deaths: (noisy * 7.0).round() / 7.0,
            });
        }
        week_end += Duration::days(7);
    }

    log::info!(
        "generated {} weekly death and {} quarterly population record(s) for {} categor(ies)",
        deaths.len(),
        population.len(),
        config.profiles.len()
    );

    Ok(SyntheticData { deaths, population })
}

fn years_since(first_day: NaiveDate, date: NaiveDate) -> f64 {
    (date - first_day).num_days() as f64 / 365.25
}

fn population_on(profile: &CategoryProfile, first_day: NaiveDate, date: NaiveDate) -> f64 {
    profile.population * (1.0 + profile.population_growth * years_since(first_day, date))
}

/// Deaths per person per day on `date`.
fn daily_rate(profile: &CategoryProfile, config: &SynthConfig, first_day: NaiveDate, date: NaiveDate) -> f64 {
    let trend = (1.0 + profile.mortality_trend).powf(years_since(first_day, date));
    // Peak around mid-January.
    let phase = 2.0 * std::f64::consts::PI * (f64::from(date.ordinal()) - 15.0) / 365.25;
    let season = 1.0 + config.seasonal_amplitude * phase.cos();
    let shock = config.shock.map_or(1.0, |s| s.factor(date));
    profile.annual_mortality / 365.25 * trend * season * shock
}

fn mix_seed(config: &SynthConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.start_year.hash(&mut hasher);
    config.end_year.hash(&mut hasher);
    for profile in &config.profiles {
        profile.name.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SynthConfig {
        SynthConfig {
            start_year: 2018,
            end_year: 2019,
            profiles: default_profiles()[..2].to_vec(),
            ..SynthConfig::default()
        }
    }

    #[test]
    fn generates_quarterly_population_and_weekly_deaths() {
        let data = generate(&small_config()).unwrap();
        assert_eq!(data.population.len(), 2 * 4 * 2);
        // 2018-01-07 is the first Sunday; 2019-12-29 the last one in range.
        assert_eq!(data.deaths.len(), 104 * 2);
        assert_eq!(data.deaths[0].week_midpoint, NaiveDate::from_ymd_opt(2018, 1, 3).unwrap());
        assert!(data.deaths.iter().all(|d| d.daily_deaths >= 0.0));
        assert!(
            data.population
                .iter()
                .all(|p| p.quarter_end.month() % 3 == 0 && p.population > 0.0)
        );
    }

    #[test]
    fn same_seed_is_reproducible() {
        let a = generate(&small_config()).unwrap();
        let b = generate(&small_config()).unwrap();
        assert_eq!(a.deaths, b.deaths);

        let c = generate(&SynthConfig {
            seed: 7,
            ..small_config()
        })
        .unwrap();
        assert_ne!(a.deaths, c.deaths);
    }

    #[test]
    fn shock_peaks_mid_span() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let shock = ExcessShock {
            start,
            days: 60,
            peak: 1.5,
        };
        assert_eq!(shock.factor(start - Duration::days(1)), 1.0);
        assert!((shock.factor(start + Duration::days(30)) - 1.5).abs() < 1e-12);
        assert!((shock.factor(start + Duration::days(15)) - 1.25).abs() < 1e-12);
        assert_eq!(shock.factor(start + Duration::days(61)), 1.0);
    }

    #[test]
    fn rejects_bad_settings() {
        let bad = SynthConfig {
            start_year: 2020,
            end_year: 2019,
            ..SynthConfig::default()
        };
        assert_eq!(generate(&bad).unwrap_err().exit_code(), 2);
        let bad = SynthConfig {
            profiles: Vec::new(),
            ..SynthConfig::default()
        };
        assert!(generate(&bad).is_err());
    }
}
