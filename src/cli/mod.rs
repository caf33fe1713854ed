//! Command-line parsing for the daily ASM / seasonal baseline tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling code. Every run option can also be supplied
//! through an `ASMR_*` environment variable (or a `.env` file).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_ANCHOR_YEARS, DEFAULT_BASELINE_END, DEFAULT_BASELINE_START, DEFAULT_DAY_STEP};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "asmr",
    version,
    about = "Daily age-standardized mortality with season-matched expected baselines"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline on death and population CSV files.
    Run(RunArgs),
    /// Write synthetic death and population CSV files.
    Synth(SynthArgs),
    /// Generate synthetic inputs in memory and run the pipeline on them.
    Demo(DemoArgs),
}

/// Input files for `asmr run`.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Weekly deaths CSV (`week_midpoint|week_end`, `category`, `daily_deaths|weekly_deaths`).
    #[arg(long, value_name = "CSV", env = "ASMR_DEATHS")]
    pub deaths: PathBuf,

    /// Quarterly population CSV (`quarter_end|year+quarter`, `category`, `population`).
    #[arg(long, value_name = "CSV", env = "ASMR_POPULATION")]
    pub population: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options shared by every command that runs the pipeline.
#[derive(Debug, Args, Clone)]
pub struct PipelineArgs {
    /// First calendar year of the regression baseline.
    #[arg(long, default_value_t = DEFAULT_BASELINE_START, env = "ASMR_BASELINE_START")]
    pub baseline_start: i32,

    /// Last calendar year of the regression baseline.
    #[arg(long, default_value_t = DEFAULT_BASELINE_END, env = "ASMR_BASELINE_END")]
    pub baseline_end: i32,

    /// Population snapshot date used as the standard population (default: latest).
    #[arg(long, value_name = "YYYY-MM-DD", env = "ASMR_REFERENCE_DATE")]
    pub reference_date: Option<NaiveDate>,

    /// Years searched on each side of a target date for season-matched points.
    #[arg(long, default_value_t = DEFAULT_ANCHOR_YEARS, env = "ASMR_ANCHOR_YEARS")]
    pub anchor_years: i32,

    /// Approximate days per year used to step between seasons.
    #[arg(long, default_value_t = DEFAULT_DAY_STEP, env = "ASMR_DAY_STEP")]
    pub day_step: f64,

    /// Only compute expected values on or after this date.
    #[arg(long, value_name = "YYYY-MM-DD", env = "ASMR_FROM")]
    pub from: Option<NaiveDate>,

    /// Only compute expected values on or before this date.
    #[arg(long, value_name = "YYYY-MM-DD", env = "ASMR_TO")]
    pub to: Option<NaiveDate>,

    /// Start of an extra period to summarize excess over (requires --excess-to).
    #[arg(long, value_name = "YYYY-MM-DD", requires = "excess_to")]
    pub excess_from: Option<NaiveDate>,

    /// End of the extra excess period (requires --excess-from).
    #[arg(long, value_name = "YYYY-MM-DD", requires = "excess_from")]
    pub excess_to: Option<NaiveDate>,
}

/// Where to persist results.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Export the per-category ASM component table to CSV.
    #[arg(long, value_name = "CSV")]
    pub components_out: Option<PathBuf>,

    /// Export the daily actual-vs-expected table to CSV.
    #[arg(long, value_name = "CSV")]
    pub expected_out: Option<PathBuf>,

    /// Export the run report (reference snapshot, failures) to JSON.
    #[arg(long, value_name = "JSON")]
    pub report_out: Option<PathBuf>,

    /// Do not print the terminal summary.
    #[arg(long)]
    pub quiet: bool,
}

/// Synthetic data shape.
#[derive(Debug, Args, Clone)]
pub struct SynthShapeArgs {
    /// First year of generated data.
    #[arg(long, default_value_t = 2010)]
    pub start_year: i32,

    /// Last year of generated data.
    #[arg(long, default_value_t = 2023)]
    pub end_year: i32,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Winter peak amplitude of mortality (relative).
    #[arg(long, default_value_t = 0.15)]
    pub seasonal_amplitude: f64,

    /// Relative standard deviation of weekly noise.
    #[arg(long, default_value_t = 0.03)]
    pub noise: f64,

    /// Start date of an excess-mortality shock.
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub shock_start: Option<NaiveDate>,

    /// Length of the shock in days.
    #[arg(long, default_value_t = 90)]
    pub shock_days: i64,

    /// Peak mortality multiplier of the shock.
    #[arg(long, default_value_t = 1.3)]
    pub shock_peak: f64,
}

/// Options for `asmr synth`.
#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Directory to write `deaths.csv` and `population.csv` into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    #[command(flatten)]
    pub shape: SynthShapeArgs,
}

/// Options for `asmr demo`.
#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub shape: SynthShapeArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}
