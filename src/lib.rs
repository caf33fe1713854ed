//! `asmr-baseline` library crate.
//!
//! Daily age-standardized mortality (ASM/ASMR) from weekly deaths and quarterly
//! population, plus a season-matched expected baseline for every day.
//!
//! The binary (`asmr`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the pipeline stages can be reused on typed records from other sources

pub mod aggregate;
pub mod app;
pub mod baseline;
pub mod cli;
pub mod compose;
pub mod data;
pub mod domain;
pub mod error;
pub mod interp;
pub mod io;
pub mod math;
pub mod report;
