//! Shared pipeline logic used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! periodic inputs -> daily interpolation -> rate composition -> aggregation
//! -> seasonal regression -> actual/expected table
//!
//! Every stage is a pure function of the previous stage's output. Failures of a
//! single category or date are collected into the run report; only a run with
//! nothing computable returns an error.

use std::collections::BTreeSet;

use crate::aggregate::{AsmSeries, aggregate_daily};
use crate::baseline::fit_expected_all;
use crate::compose::{ReferencePopulation, compose, join_daily, latest_snapshot_date, reference_population};
use crate::domain::{
    ActualVsExpected, AsmComponent, DailyAggregate, DeathObservation, PeriodicObservation, PipelineConfig,
    PopulationObservation,
};
use crate::error::{AppError, SeriesKind, UnitError};
use crate::interp::{DailySet, DateRange, interpolate_daily};
use crate::report::{ExcessSummary, RunReport, count_by_kind, summarize_by_year, summarize_period};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub grid: DateRange,
    pub reference: ReferencePopulation,
    pub components: Vec<AsmComponent>,
    pub aggregates: Vec<DailyAggregate>,
    pub table: Vec<ActualVsExpected>,
    pub yearly_excess: Vec<ExcessSummary>,
    pub period_excess: Option<ExcessSummary>,
    pub report: RunReport,
}

/// Execute the full pipeline on typed inputs.
pub fn run_pipeline(
    deaths: &[DeathObservation],
    population: &[PopulationObservation],
    config: &PipelineConfig,
) -> Result<RunOutput, AppError> {
    config.validate()?;
    if deaths.is_empty() || population.is_empty() {
        return Err(AppError::new(3, "Both death and population observations are required."));
    }

    let death_obs: Vec<PeriodicObservation> = deaths.iter().map(PeriodicObservation::from).collect();
    let pop_obs: Vec<PeriodicObservation> = population.iter().map(PeriodicObservation::from).collect();

    // 1) One shared daily grid spanning every input date.
    let grid = DateRange::covering(death_obs.iter().chain(&pop_obs).map(|o| o.date))
        .ok_or_else(|| AppError::new(3, "No input dates."))?;
    log::info!(
        "interpolating {} death and {} population observation(s) over {} .. {}",
        death_obs.len(),
        pop_obs.len(),
        grid.start,
        grid.end
    );

    // 2) Daily series per category.
    let death_days = interpolate_daily(&death_obs, SeriesKind::Deaths, grid);
    let pop_days = interpolate_daily(&pop_obs, SeriesKind::Population, grid);

    let mut failures: Vec<UnitError> = Vec::new();
    failures.extend(death_days.failures.iter().cloned());
    failures.extend(pop_days.failures.iter().cloned());
    failures.extend(one_sided_categories(&death_obs, &pop_obs));

    // 3) Fixed reference population.
    let reference_date = config
        .reference_date
        .or_else(|| latest_snapshot_date(population))
        .ok_or_else(|| AppError::new(3, "No population snapshot available for the reference."))?;
    let usable = usable_categories(&death_days, &pop_days);
    let (reference, missing_reference) =
        reference_population(&pop_days, usable.iter().map(String::as_str), reference_date);
    failures.extend(missing_reference);
    if reference.weights.is_empty() {
        return Err(AppError::new(
            3,
            format!("No category has both daily deaths and a reference population on {reference_date}."),
        ));
    }
    log::info!(
        "reference population on {}: {} categor(ies), total {:.0}",
        reference.date,
        reference.weights.len(),
        reference.total()
    );

    // 4) Join, compose, aggregate.
    let joined = join_daily(&death_days, &pop_days, &reference, grid);
    let composed = compose(&joined.records, &reference);
    if !joined.missing.is_empty() {
        log::warn!("{} day/category join miss(es) excluded", joined.missing.len());
    }
    failures.extend(joined.missing);
    failures.extend(composed.failures);

    let aggregates = aggregate_daily(&composed.components, &reference);
    if aggregates.is_empty() {
        return Err(AppError::new(3, "No date has a valid age-standardized value."));
    }

    // 5) One regression per output date.
    let series = AsmSeries::from_aggregates(&aggregates);
    let targets: Vec<_> = aggregates
        .iter()
        .map(|a| a.date)
        .filter(|date| config.in_output_window(*date))
        .collect();
    log::info!("fitting seasonal baselines for {} date(s)", targets.len());
    let fits = fit_expected_all(&series, &config.baseline, &targets);

    let total = reference.total();
    let mut table = Vec::with_capacity(targets.len());
    let mut expected_days = 0;
    let mut fit_iter = fits.into_iter();
    for agg in aggregates.iter().filter(|a| config.in_output_window(a.date)) {
        let fit = match fit_iter.next() {
            Some(Ok(fit)) => {
                expected_days += 1;
                Some(fit)
            }
            Some(Err(err)) => {
                log::debug!("{err}");
                failures.push(err);
                None
            }
            None => None,
        };
        table.push(ActualVsExpected {
            date: agg.date,
            raw_deaths: agg.raw_deaths,
            raw_population: agg.raw_population,
            asm: agg.asm,
            asmr: agg.asmr,
            intercept: fit.map(|f| f.intercept),
            slope: fit.map(|f| f.slope),
            expected_asm: fit.map(|f| f.expected),
            expected_asmr: fit.map(|f| f.expected / total),
            excess_asm: fit.map(|f| agg.asm - f.expected),
        });
    }

    let degenerate = table.len() - expected_days;
    if degenerate > 0 {
        log::warn!("{degenerate} date(s) have no expected value (degenerate regression)");
    }

    // 6) Excess summaries.
    let yearly_excess = summarize_by_year(&table);
    let period_excess = config
        .excess_period
        .and_then(|(from, to)| summarize_period(&table, format!("{from}..{to}"), from, to));

    let report = RunReport {
        grid_start: grid.start,
        grid_end: grid.end,
        reference_date: reference.date,
        reference_total: total,
        reference_weights: reference.weights.clone(),
        component_rows: composed.components.len(),
        aggregate_days: aggregates.len(),
        expected_days,
        failure_counts: count_by_kind(&failures),
        failures,
    };

    Ok(RunOutput {
        grid,
        reference,
        components: composed.components,
        aggregates,
        table,
        yearly_excess,
        period_excess,
        report,
    })
}

/// Categories with a daily series on both sides.
fn usable_categories(deaths: &DailySet, population: &DailySet) -> Vec<String> {
    deaths
        .series
        .keys()
        .filter(|c| population.series.contains_key(*c))
        .cloned()
        .collect()
}

/// Categories that appear in only one of the inputs get an `InsufficientData`
/// failure with zero observations on the missing side.
fn one_sided_categories(deaths: &[PeriodicObservation], population: &[PeriodicObservation]) -> Vec<UnitError> {
    let death_cats: BTreeSet<&str> = deaths.iter().map(|o| o.category.as_str()).collect();
    let pop_cats: BTreeSet<&str> = population.iter().map(|o| o.category.as_str()).collect();

    let missing_pop = death_cats.difference(&pop_cats).map(|c| UnitError::InsufficientData {
        series: SeriesKind::Population,
        category: c.to_string(),
        observed: 0,
    });
    let missing_deaths = pop_cats.difference(&death_cats).map(|c| UnitError::InsufficientData {
        series: SeriesKind::Deaths,
        category: c.to_string(),
        observed: 0,
    });
    missing_pop.chain(missing_deaths).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn death(date: NaiveDate, category: &str, daily: f64) -> DeathObservation {
        DeathObservation {
            week_midpoint: date,
            category: category.to_string(),
            daily_deaths: daily,
        }
    }

    fn pop(date: NaiveDate, category: &str, population: f64) -> PopulationObservation {
        PopulationObservation {
            quarter_end: date,
            category: category.to_string(),
            population,
        }
    }

    /// Two categories: deaths 7 days apart, population 90 days apart.
    fn two_category_inputs(d0: NaiveDate) -> (Vec<DeathObservation>, Vec<PopulationObservation>) {
        let d7 = d0 + Duration::days(7);
        let d90 = d0 + Duration::days(90);
        let deaths = vec![
            death(d0, "young", 10.0),
            death(d7, "young", 14.0),
            death(d0, "old", 20.0),
            death(d7, "old", 27.0),
        ];
        let population = vec![
            pop(d0, "young", 1000.0),
            pop(d90, "young", 1014.0),
            pop(d0, "old", 2000.0),
            pop(d90, "old", 2090.0),
        ];
        (deaths, population)
    }

    #[test]
    fn hand_computed_asmr_matches_pipeline() {
        let d0 = d(2020, 1, 1);
        let (deaths, population) = two_category_inputs(d0);
        let run = run_pipeline(&deaths, &population, &PipelineConfig::default()).unwrap();

        // Reference = latest snapshot (d0 + 90): young 1014, old 2090.
        assert_eq!(run.reference.date, d0 + Duration::days(90));
        assert_eq!(run.reference.weight("young"), Some(1014.0));
        assert_eq!(run.reference.weight("old"), Some(2090.0));

        let t = 3.0;
        let young_rate = (10.0 + t * 4.0 / 7.0) / (1000.0 + t * 14.0 / 90.0);
        let old_rate = (20.0 + t * 1.0) / (2000.0 + t * 90.0 / 90.0);
        let asm = young_rate * 1014.0 + old_rate * 2090.0;
        let asmr = asm / (1014.0 + 2090.0);

        let day = d0 + Duration::days(3);
        let row = run.aggregates.iter().find(|a| a.date == day).unwrap();
        assert!((row.asm - asm).abs() < 1e-9);
        assert!((row.asmr - asmr).abs() < 1e-9);
        assert!((row.raw_deaths - (10.0 + t * 4.0 / 7.0 + 23.0)).abs() < 1e-9);
    }

    #[test]
    fn percapita_increases_linearly_between_weekly_points() {
        let d0 = d(2020, 1, 1);
        let (deaths, population) = two_category_inputs(d0);
        let run = run_pipeline(&deaths, &population, &PipelineConfig::default()).unwrap();

        let young: Vec<f64> = run
            .components
            .iter()
            .filter(|c| c.category == "young" && c.date < d0 + Duration::days(8))
            .map(|c| c.deaths)
            .collect();
        assert_eq!(young.len(), 8);
        for pair in young.windows(2) {
            assert!((pair[1] - pair[0] - 4.0 / 7.0).abs() < 1e-12);
        }
        // Past the last weekly point the final rate keeps applying.
        let late = run
            .components
            .iter()
            .find(|c| c.category == "young" && c.date == d0 + Duration::days(90))
            .unwrap();
        assert!((late.deaths - (10.0 + 90.0 * 4.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn asmr_is_invariant_to_uniform_population_rescaling() {
        let d0 = d(2020, 1, 1);
        let (deaths, population) = two_category_inputs(d0);
        let base = run_pipeline(&deaths, &population, &PipelineConfig::default()).unwrap();

        let k = 3.5;
        let scaled_deaths: Vec<_> = deaths
            .iter()
            .map(|o| DeathObservation {
                daily_deaths: o.daily_deaths * k,
                ..o.clone()
            })
            .collect();
        let scaled_pop: Vec<_> = population
            .iter()
            .map(|o| PopulationObservation {
                population: o.population * k,
                ..o.clone()
            })
            .collect();
        let scaled = run_pipeline(&scaled_deaths, &scaled_pop, &PipelineConfig::default()).unwrap();

        assert_eq!(base.aggregates.len(), scaled.aggregates.len());
        for (a, b) in base.aggregates.iter().zip(&scaled.aggregates) {
            assert!((a.asmr - b.asmr).abs() < 1e-12, "{} vs {}", a.asmr, b.asmr);
        }
    }

    #[test]
    fn short_history_reports_degenerate_dates_without_aborting() {
        let d0 = d(2020, 1, 1);
        let (deaths, population) = two_category_inputs(d0);
        let run = run_pipeline(&deaths, &population, &PipelineConfig::default()).unwrap();

        // 2020 data only: no candidate lands in 2013-2019 with data.
        assert_eq!(run.report.expected_days, 0);
        assert_eq!(run.table.len(), run.aggregates.len());
        assert!(run.table.iter().all(|r| r.expected_asm.is_none()));
        assert_eq!(run.report.count("degenerate_regression"), run.table.len());
    }

    #[test]
    fn failing_categories_are_reported_and_excluded() {
        let d0 = d(2020, 1, 1);
        let (mut deaths, mut population) = two_category_inputs(d0);
        deaths.push(death(d0, "sparse", 1.0));
        population.push(pop(d0, "sparse", 100.0));
        population.push(pop(d0 + Duration::days(90), "sparse", 100.0));
        population.push(pop(d0, "unmatched", 50.0));
        population.push(pop(d0 + Duration::days(90), "unmatched", 50.0));

        let run = run_pipeline(&deaths, &population, &PipelineConfig::default()).unwrap();

        assert_eq!(run.reference.weights.len(), 2);
        assert_eq!(run.reference.total(), 1014.0 + 2090.0);
        assert_eq!(run.report.count("insufficient_data"), 2);
        assert!(run.components.iter().all(|c| c.category != "sparse"));
    }

    #[test]
    fn late_starting_deaths_produce_missing_joins() {
        let d0 = d(2020, 1, 1);
        let (mut deaths, population) = two_category_inputs(d0);
        // "old" deaths only start on day 5.
        deaths.retain(|o| o.category != "old");
        deaths.push(death(d0 + Duration::days(5), "old", 20.0));
        deaths.push(death(d0 + Duration::days(12), "old", 27.0));

        let run = run_pipeline(&deaths, &population, &PipelineConfig::default()).unwrap();
        let joins = run.report.missing_joins_by_category();
        assert_eq!(joins.get("old"), Some(&5));
        assert_eq!(joins.get("young"), None);

        // Denominator stays the full reference total on partially covered days.
        let day1 = run.aggregates.iter().find(|a| a.date == d0 + Duration::days(1)).unwrap();
        assert_eq!(day1.categories, 1);
        assert!((day1.asmr - day1.asm / (1014.0 + 2090.0)).abs() < 1e-15);
    }

    #[test]
    fn multi_year_run_fills_expected_values() {
        // Flat weekly deaths 2012-2021 and flat population.
        let start = d(2012, 1, 4);
        let mut deaths = Vec::new();
        let mut week = start;
        while week < d(2022, 1, 1) {
            deaths.push(death(week, "all", 100.0));
            week += Duration::days(7);
        }
        let population = vec![pop(d(2011, 12, 31), "all", 1_000_000.0), pop(d(2021, 12, 31), "all", 1_000_000.0)];

        let config = PipelineConfig {
            output_from: Some(d(2020, 1, 1)),
            output_to: Some(d(2020, 12, 31)),
            excess_period: Some((d(2020, 3, 1), d(2020, 5, 31))),
            ..PipelineConfig::default()
        };
        let run = run_pipeline(&deaths, &population, &config).unwrap();

        assert_eq!(run.table.len(), 366);
        assert_eq!(run.report.expected_days, 366);
        for row in &run.table {
            assert!((row.expected_asm.unwrap() - 100.0).abs() < 1e-6);
            assert!(row.excess_asm.unwrap().abs() < 1e-6);
        }
        assert_eq!(run.yearly_excess.len(), 1);
        let period = run.period_excess.as_ref().unwrap();
        assert_eq!(period.days, 92);
        assert!(period.excess_asm.abs() < 1e-4);
    }

    #[test]
    fn invalid_config_and_empty_inputs_abort() {
        let d0 = d(2020, 1, 1);
        let (deaths, population) = two_category_inputs(d0);
        let mut config = PipelineConfig::default();
        config.baseline.day_step = 0.0;
        assert_eq!(run_pipeline(&deaths, &population, &config).unwrap_err().exit_code(), 2);
        assert_eq!(
            run_pipeline(&[], &population, &PipelineConfig::default())
                .unwrap_err()
                .exit_code(),
            3
        );
    }
}
