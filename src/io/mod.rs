//! Input/output helpers.
//!
//! - CSV ingest of typed records (`ingest`)
//! - CSV exports of the output tables (`export`)
//! - run report JSON (`report`)

pub mod export;
pub mod ingest;
pub mod report;

pub use export::*;
pub use ingest::*;
pub use report::*;
