//! CSV exports.
//!
//! Output tables are meant to be easy to consume in spreadsheets or plotting
//! scripts. Invalid or unavailable values are written as empty cells.

use std::path::Path;

use serde::Serialize;

use crate::domain::{ActualVsExpected, AsmComponent, DeathObservation, PopulationObservation};
use crate::error::AppError;

/// Write the per-category ASM component table.
pub fn write_components_csv(path: &Path, components: &[AsmComponent]) -> Result<(), AppError> {
    write_rows(path, components)
}

/// Write the daily actual-vs-expected table.
pub fn write_expected_csv(path: &Path, rows: &[ActualVsExpected]) -> Result<(), AppError> {
    write_rows(path, rows)
}

/// Write death records in the layout `load_deaths` reads back.
pub fn write_deaths_csv(path: &Path, deaths: &[DeathObservation]) -> Result<(), AppError> {
    write_rows(path, deaths)
}

/// Write population records in the layout `load_population` reads back.
pub fn write_population_csv(path: &Path, population: &[PopulationObservation]) -> Result<(), AppError> {
    write_rows(path, population)
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row to '{}': {e}", path.display())))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))?;

    log::info!("wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}
