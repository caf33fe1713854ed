//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments
//! - loads or generates the typed inputs
//! - runs the pipeline
//! - prints the summary and writes optional exports

use clap::Parser;

use crate::cli::{Command, DemoArgs, OutputArgs, PipelineArgs, RunArgs, SynthArgs, SynthShapeArgs};
use crate::data::{ExcessShock, SynthConfig};
use crate::domain::{BaselineConfig, PipelineConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `asmr` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Synth(args) => handle_synth(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn init_logging() {
    // `try_init` so repeated calls (tests, embedding) are harmless.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args.pipeline);

    let deaths = crate::io::load_deaths(&args.deaths)?;
    let population = crate::io::load_population(&args.population)?;
    log_row_errors("deaths", &deaths.row_errors, deaths.rows_read);
    log_row_errors("population", &population.row_errors, population.rows_read);

    let run = pipeline::run_pipeline(&deaths.records, &population.records, &config)?;
    emit(&run, &config, &args.output)
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let data = crate::data::generate(&synth_config_from_args(&args.shape))?;

    std::fs::create_dir_all(&args.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output dir '{}': {e}", args.out_dir.display()),
        )
    })?;
    crate::io::write_deaths_csv(&args.out_dir.join("deaths.csv"), &data.deaths)?;
    crate::io::write_population_csv(&args.out_dir.join("population.csv"), &data.population)?;
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = pipeline_config_from_args(&args.pipeline);
    let data = crate::data::generate(&synth_config_from_args(&args.shape))?;

    let run = pipeline::run_pipeline(&data.deaths, &data.population, &config)?;
    emit(&run, &config, &args.output)
}

fn emit(run: &pipeline::RunOutput, config: &PipelineConfig, output: &OutputArgs) -> Result<(), AppError> {
    if !output.quiet {
        println!("{}", crate::report::format_run_summary(run, config));
    }

    if let Some(path) = &output.components_out {
        crate::io::write_components_csv(path, &run.components)?;
    }
    if let Some(path) = &output.expected_out {
        crate::io::write_expected_csv(path, &run.table)?;
    }
    if let Some(path) = &output.report_out {
        crate::io::write_report_json(path, &run.report)?;
    }

    Ok(())
}

fn log_row_errors(what: &str, errors: &[crate::io::RowError], rows_read: usize) {
    if errors.is_empty() {
        log::info!("{what}: {rows_read} row(s) read");
        return;
    }
    log::warn!("{what}: {} of {rows_read} row(s) rejected", errors.len());
    for err in errors.iter().take(10) {
        log::warn!("  line {}: {}", err.line, err.message);
    }
}

pub fn pipeline_config_from_args(args: &PipelineArgs) -> PipelineConfig {
    PipelineConfig {
        baseline: BaselineConfig {
            start_year: args.baseline_start,
            end_year: args.baseline_end,
            anchor_years: args.anchor_years,
            day_step: args.day_step,
        },
        reference_date: args.reference_date,
        output_from: args.from,
        output_to: args.to,
        excess_period: args.excess_from.zip(args.excess_to),
    }
}

pub fn synth_config_from_args(args: &SynthShapeArgs) -> SynthConfig {
    SynthConfig {
        start_year: args.start_year,
        end_year: args.end_year,
        seed: args.seed,
        seasonal_amplitude: args.seasonal_amplitude,
        noise: args.noise,
        shock: args.shock_start.map(|start| ExcessShock {
            start,
            days: args.shock_days,
            peak: args.shock_peak,
        }),
        ..SynthConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::cli::Cli;

    #[test]
    fn demo_with_shock_shows_positive_excess_in_shock_year() {
        let cli = Cli::try_parse_from([
            "asmr",
            "demo",
            "--start-year",
            "2012",
            "--end-year",
            "2021",
            "--noise",
            "0.0",
            "--shock-start",
            "2020-03-15",
            "--shock-days",
            "80",
            "--shock-peak",
            "1.5",
            "--from",
            "2020-01-01",
            "--to",
            "2020-12-31",
            "--excess-from",
            "2020-03-15",
            "--excess-to",
            "2020-06-02",
        ])
        .unwrap();
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };

        let config = pipeline_config_from_args(&args.pipeline);
        assert_eq!(
            config.excess_period,
            Some((
                NaiveDate::from_ymd_opt(2020, 3, 15).unwrap(),
                NaiveDate::from_ymd_opt(2020, 6, 2).unwrap()
            ))
        );

        let data = crate::data::generate(&synth_config_from_args(&args.shape)).unwrap();
        let run = pipeline::run_pipeline(&data.deaths, &data.population, &config).unwrap();

        assert_eq!(run.report.expected_days, 366);
        let period = run.period_excess.as_ref().unwrap();
        assert!(period.excess_pct.unwrap() > 10.0, "{period:?}");

        let summary = crate::report::format_run_summary(&run, &config);
        assert!(summary.contains("Excess ASM by year"));
        assert!(summary.contains("2020"));
    }
}
