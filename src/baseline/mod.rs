//! Seasonal regression baseline.
//!
//! Responsibilities:
//!
//! - generate season-matched candidate dates (`candidates`)
//! - fit one trend line per output date, in parallel (`engine`)

pub mod candidates;
pub mod engine;

pub use candidates::*;
pub use engine::*;
