//! Used-Vehicle Listing Pipeline Library
//!
//! Normalizes raw used-vehicle listings into a relational store and derives
//! an analysis dataset from it, built with Rust and Polars.
//!
//! # Overview
//!
//! Two batch runs share one entity store:
//!
//! - **Ingestion** ([`Ingestor`]): cleans mileage and price text, maps fuel
//!   type and transmission onto closed vocabularies, deduplicates vehicles,
//!   persists them, links every listing back to its vehicle and persists
//!   the listings.
//! - **ETL** ([`EtlPipeline`]): reads the joined vehicle/listing view,
//!   removes mileage and price outliers, derives `vehicle_age` and
//!   `mileage_rate`, imputes `engine_size_cc` and writes a CSV.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use carlot_processing::{EtlPipeline, Ingestor, SqliteStore};
//! use std::path::Path;
//!
//! let mut store = SqliteStore::open("data/used_cars.db")?;
//! store.provision()?;
//!
//! let outcome = Ingestor::default().ingest_file(Path::new("data/raw/used_cars.csv"), &mut store)?;
//! println!("{} listings unresolved", outcome.report.resolution.unresolved());
//!
//! let report = EtlPipeline::new(2024).run(&store, Path::new("data/processed/cleaned_car_data.csv"))?;
//! println!("{} rows written", report.rows_written);
//! ```
//!
//! # Stores
//!
//! Both runs talk to the store through the [`store::EntityStore`] trait.
//! [`SqliteStore`] persists to a database file; [`MemoryStore`] keeps
//! everything in process.
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to collect paths and run parameters:
//!
//! ```rust,ignore
//! use carlot_processing::PipelineConfig;
//!
//! let config = PipelineConfig::from_env()   // CARLOT_* variables and .env
//!     .output_path("out/cleaned.csv")
//!     .current_year(2024)
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod ingest;
pub mod pipeline;
pub mod reporting;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{Canonicalizer, SchemaMapper, clean_mileage, clean_price, dedup_vehicles};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use imputers::{ImputationReport, KnnImputer};
pub use ingest::{IngestionOutcome, Ingestor, ReferentialResolver, Resolution, ResolutionReport};
pub use pipeline::{EtlOutput, EtlPipeline, FeatureEngineer, FilterReport, OutlierFilter};
pub use reporting::{EtlReport, IngestionReport};
pub use store::{EntityStore, MemoryStore, SqliteStore};
pub use types::{
    FuelType, Listing, ListingId, NaturalKey, NewListing, NewVehicle, RawListingRecord, RawValue,
    SourceKey, Transmission, Vehicle, VehicleId,
};
