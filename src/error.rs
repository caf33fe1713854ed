//! Error types.
//!
//! Two layers:
//!
//! - [`AppError`]: a run-level failure carrying a process exit code
//!   (2 = input/config/I-O, 3 = nothing computable, 4 = internal).
//! - [`UnitError`]: a failure isolated to one category or one date. These never
//!   abort a run; they are collected into the run report.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Which daily series a row was found in during a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Deaths,
    Population,
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesKind::Deaths => write!(f, "deaths"),
            SeriesKind::Population => write!(f, "population"),
        }
    }
}

/// A failure scoped to a single category or a single date.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitError {
    #[error("{series} series for category '{category}' has {observed} observation(s); at least 2 are required")]
    InsufficientData {
        series: SeriesKind,
        category: String,
        observed: usize,
    },
    #[error("{series} series for category '{category}' has more than one observation on {date}")]
    DuplicateObservation {
        series: SeriesKind,
        category: String,
        date: NaiveDate,
    },
    #[error("category '{category}' has no population on reference date {reference_date}")]
    MissingReference {
        category: String,
        reference_date: NaiveDate,
    },
    #[error("{date} category '{category}' has {present_in} but no {missing_from}")]
    MissingJoin {
        date: NaiveDate,
        category: String,
        present_in: SeriesKind,
        missing_from: SeriesKind,
    },
    #[error("population for category '{category}' on {date} is zero or missing")]
    ZeroOrMissingPopulation { date: NaiveDate, category: String },
    #[error("expected value for {date} has {points} baseline point(s); at least 2 are required")]
    DegenerateRegression { date: NaiveDate, points: usize },
}

impl UnitError {
    /// Stable short label used for grouping in reports.
    pub fn kind_label(&self) -> &'static str {
        match self {
            UnitError::InsufficientData { .. } => "insufficient_data",
            UnitError::DuplicateObservation { .. } => "duplicate_observation",
            UnitError::MissingReference { .. } => "missing_reference",
            UnitError::MissingJoin { .. } => "missing_join",
            UnitError::ZeroOrMissingPopulation { .. } => "zero_or_missing_population",
            UnitError::DegenerateRegression { .. } => "degenerate_regression",
        }
    }

    /// Category-wide failures remove the category from the run.
    pub fn is_category_fatal(&self) -> bool {
        matches!(
            self,
            UnitError::InsufficientData { .. }
                | UnitError::DuplicateObservation { .. }
                | UnitError::MissingReference { .. }
        )
    }
}
