//! Input data sources that do not come from files.

pub mod synthetic;

pub use synthetic::{CategoryProfile, ExcessShock, SynthConfig, SyntheticData, default_profiles, generate};
