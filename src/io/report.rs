//! Run report JSON.
//!
//! The report is the audit trail of a run: the reference snapshot, coverage
//! counts, and every per-category or per-date failure.

use std::fs::File;
use std::path::Path;

use crate::error::AppError;
use crate::report::RunReport;

/// Write the run report as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &RunReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    log::info!("wrote run report to {}", path.display());
    Ok(())
}
