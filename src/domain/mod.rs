//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - typed input records (`DeathObservation`, `PopulationObservation`)
//! - intermediate daily records (`DailyRecord`, `AsmComponent`, `DailyAggregate`)
//! - regression outputs (`ExpectedRecord`, `ActualVsExpected`)
//! - run configuration (`PipelineConfig`, `BaselineConfig`)
//! - representative-date anchoring (`anchor`)

pub mod anchor;
pub mod types;

pub use anchor::*;
pub use types::*;
