use crate::error::Result;
use crate::imputers::ImputationReport;
use crate::ingest::ResolutionReport;
use crate::pipeline::FilterReport;
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Run Reports
// ============================================================================

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file, if the records came from one
    pub input_file: Option<String>,
    /// Store backend the run wrote to
    pub store: String,
    pub records_read: usize,
    /// Rows whose mileage fell back to 0
    pub mileage_defaulted: usize,
    /// Rows whose price fell back to 0.0
    pub price_defaulted: usize,
    pub truncated_models: usize,
    pub vehicles_inserted: usize,
    /// Exact-duplicate vehicles dropped before persistence
    pub duplicates_dropped: usize,
    pub listings_inserted: usize,
    pub resolution: ResolutionReport,
    pub duration_ms: u64,
}

/// Summary of one ETL run.
#[derive(Debug, Clone, Serialize)]
pub struct EtlReport {
    pub generated_at: String,
    pub output_file: Option<String>,
    pub store: String,
    /// Joined rows read from the store
    pub rows_loaded: usize,
    pub filter: FilterReport,
    pub imputation: ImputationReport,
    pub current_year: i32,
    pub rows_written: usize,
    pub columns: Vec<String>,
    pub duration_ms: u64,
}

pub(crate) fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Write a report as pretty JSON to `<dir>/<base_name>_report.json`.
pub fn write_report_to_file<R: Serialize>(
    report: &R,
    dir: &Path,
    base_name: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let report_path = dir.join(format!("{}_report.json", base_name));
    let mut file = File::create(&report_path)?;
    file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

    info!("Report saved: {}", report_path.display());

    Ok(report_path)
}
