//! Rate composition: daily deaths + daily population → per-capita rates and
//! age-standardized contributions.
//!
//! The standard population is the category population on a single reference
//! date, chosen once per run. Every date is weighted by the same snapshot.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{AsmComponent, DailyRecord, PopulationObservation};
use crate::error::{SeriesKind, UnitError};
use crate::interp::{DailySet, DateRange};

/// Fixed per-category weights taken from one population snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePopulation {
    pub date: NaiveDate,
    pub weights: BTreeMap<String, f64>,
}

impl ReferencePopulation {
    pub fn weight(&self, category: &str) -> Option<f64> {
        self.weights.get(category).copied()
    }

    /// Sum of every category's weight (the ASMR denominator).
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }
}

/// Latest quarter-end date present in the population input.
pub fn latest_snapshot_date(population: &[PopulationObservation]) -> Option<NaiveDate> {
    population.iter().map(|p| p.quarter_end).max()
}

/// Read each category's population on `date` from the daily series.
///
/// Only `categories` are considered. A category without a positive, finite
/// population on that date is reported as `MissingReference` and gets no
/// weight. A date past a category's last observation uses the extrapolated
/// value and is logged.
pub fn reference_population<'a>(
    population: &DailySet,
    categories: impl IntoIterator<Item = &'a str>,
    date: NaiveDate,
) -> (ReferencePopulation, Vec<UnitError>) {
    let mut weights = BTreeMap::new();
    let mut failures = Vec::new();

    for category in categories {
        let series = population.get(category);
        match series.and_then(|s| s.get(date)) {
            Some(value) if value.is_finite() && value > 0.0 => {
                if let Some(s) = series.filter(|s| s.is_extrapolated(date)) {
                    log::warn!(
                        "reference population for '{category}' on {date} is extrapolated past its last observation {}",
                        s.last_observed
                    );
                }
                weights.insert(category.to_string(), value);
            }
            _ => failures.push(UnitError::MissingReference {
                category: category.to_string(),
                reference_date: date,
            }),
        }
    }

    (ReferencePopulation { date, weights }, failures)
}

/// Joined daily records plus every join miss encountered.
#[derive(Debug, Clone, Default)]
pub struct JoinedDaily {
    pub records: Vec<DailyRecord>,
    pub missing: Vec<UnitError>,
}

/// Join deaths and population per `(date, category)` over `grid`.
///
/// Records come out ordered by date, then category. A day where only one side
/// has a value is a `MissingJoin`; a day where neither does is outside both
/// series and is skipped silently.
pub fn join_daily(
    deaths: &DailySet,
    population: &DailySet,
    reference: &ReferencePopulation,
    grid: DateRange,
) -> JoinedDaily {
    let mut out = JoinedDaily::default();
    for date in grid.iter() {
        for category in reference.categories() {
            let d = deaths.get(category).and_then(|s| s.get(date));
            let p = population.get(category).and_then(|s| s.get(date));
            match (d, p) {
                (Some(deaths), Some(population)) => out.records.push(DailyRecord {
                    date,
                    category: category.to_string(),
                    deaths,
                    population,
                }),
                (Some(_), None) => out.missing.push(UnitError::MissingJoin {
                    date,
                    category: category.to_string(),
                    present_in: SeriesKind::Deaths,
                    missing_from: SeriesKind::Population,
                }),
                (None, Some(_)) => out.missing.push(UnitError::MissingJoin {
                    date,
                    category: category.to_string(),
                    present_in: SeriesKind::Population,
                    missing_from: SeriesKind::Deaths,
                }),
                (None, None) => {}
            }
        }
    }
    out
}

/// Deaths per person per day, or `None` when the population cannot divide.
pub fn percapita(deaths: f64, population: f64) -> Option<f64> {
    if population.is_finite() && population > 0.0 && deaths.is_finite() {
        Some(deaths / population)
    } else {
        None
    }
}

/// Components plus the rows whose population could not be used.
#[derive(Debug, Clone, Default)]
pub struct Composed {
    pub components: Vec<AsmComponent>,
    pub failures: Vec<UnitError>,
}

/// Compute the per-capita rate and ASM contribution for every joined record.
///
/// Records whose category has no reference weight are skipped; the join only
/// produces records for reference categories, so this does not happen in a
/// normal run.
pub fn compose(records: &[DailyRecord], reference: &ReferencePopulation) -> Composed {
    let mut out = Composed::default();
    for record in records {
        let Some(standard_population) = reference.weight(&record.category) else {
            continue;
        };
        let rate = percapita(record.deaths, record.population);
        if rate.is_none() {
            out.failures.push(UnitError::ZeroOrMissingPopulation {
                date: record.date,
                category: record.category.clone(),
            });
        }
        out.components.push(AsmComponent {
            date: record.date,
            category: record.category.clone(),
            deaths: record.deaths,
            population: record.population,
            percapita: rate,
            standard_population,
            asm_contribution: rate.map(|r| r * standard_population),
        });
    }
    out
}
