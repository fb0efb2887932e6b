//! Pipeline module.
//!
//! This module provides the ETL run over persisted listings and its steps.

mod executor;
pub mod features;
pub mod frame;
pub mod outliers;

pub use executor::{ENGINE_SIZE_NEIGHBORS, EtlOutput, EtlPipeline, write_csv};
pub use features::FeatureEngineer;
pub use frame::{JOINED_COLUMNS, OUTPUT_COLUMNS, joined_frame};
pub use outliers::{FilterReport, MAX_MILEAGE, MIN_PRICE, OutlierFilter};
