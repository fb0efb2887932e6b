//! Run reports.
//!
//! [`IngestionReport`] and [`EtlReport`] summarise a run for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use carlot_processing::reporting::write_report_to_file;
//!
//! let outcome = ingestor.ingest_file(&input, &mut store)?;
//! println!("{}", serde_json::to_string_pretty(&outcome.report)?);
//! write_report_to_file(&outcome.report, Path::new("reports"), "ingest")?;
//! ```

mod summary;

pub use summary::{EtlReport, IngestionReport, write_report_to_file};
pub(crate) use summary::timestamp;
