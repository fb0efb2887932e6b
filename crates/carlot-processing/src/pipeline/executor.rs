//! ETL executor module.
//!
//! Reads the joined view from the store, cleans and enriches it, and writes
//! the analysis dataset.

use super::features::FeatureEngineer;
use super::frame::{OUTPUT_COLUMNS, joined_frame};
use super::outliers::{FilterReport, OutlierFilter};
use crate::error::{Result, ResultExt};
use crate::imputers::{ImputationReport, KnnImputer};
use crate::reporting::{EtlReport, timestamp};
use crate::store::EntityStore;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Neighbours used to fill `engine_size_cc`.
pub const ENGINE_SIZE_NEIGHBORS: usize = 5;

/// Frame produced by [`EtlPipeline::transform`] and what each step did.
#[derive(Debug, Clone)]
pub struct EtlOutput {
    pub frame: DataFrame,
    pub filter: FilterReport,
    pub imputation: ImputationReport,
}

/// Executes the ETL steps on the joined listings.
pub struct EtlPipeline {
    features: FeatureEngineer,
    imputer: KnnImputer,
}

impl Default for EtlPipeline {
    fn default() -> Self {
        Self::with_features(FeatureEngineer::default())
    }
}

impl EtlPipeline {
    /// Pipeline computing vehicle age against `current_year`.
    pub fn new(current_year: i32) -> Self {
        Self::with_features(FeatureEngineer::new(current_year))
    }

    pub fn with_features(features: FeatureEngineer) -> Self {
        Self {
            features,
            imputer: KnnImputer::new(ENGINE_SIZE_NEIGHBORS),
        }
    }

    pub fn current_year(&self) -> i32 {
        self.features.current_year()
    }

    /// Filter, derive and impute. Output columns follow [`OUTPUT_COLUMNS`].
    pub fn transform(&self, df: &DataFrame) -> Result<EtlOutput> {
        info!("Step 1: Removing outliers...");
        let (df, filter) = OutlierFilter::apply(df)?;

        info!("Step 2: Deriving features...");
        let df = self.features.apply(&df)?;

        info!("Step 3: Imputing engine size...");
        let (df, imputation) =
            self.imputer
                .fit_transform(&df, "engine_size_cc", &["engine_size_cc"])?;

        let frame = df.select(OUTPUT_COLUMNS)?;
        Ok(EtlOutput {
            frame,
            filter,
            imputation,
        })
    }

    /// Run the whole ETL against `store`, writing the dataset to `output`.
    pub fn run<S: EntityStore + ?Sized>(&self, store: &S, output: &Path) -> Result<EtlReport> {
        let start = Instant::now();

        let records = store
            .joined_records()
            .context("Failed to load joined listings")?;
        info!("Loaded {} listings from {} store", records.len(), store.name());

        let joined = joined_frame(&records)?;
        let EtlOutput {
            mut frame,
            filter,
            imputation,
        } = self.transform(&joined)?;

        write_csv(&mut frame, output)?;

        Ok(EtlReport {
            generated_at: timestamp(),
            output_file: Some(output.display().to_string()),
            store: store.name().to_string(),
            rows_loaded: records.len(),
            filter,
            imputation,
            current_year: self.current_year(),
            rows_written: frame.height(),
            columns: frame
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Write `df` as CSV with a header, creating the parent directory.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context(format!("Failed to write {}", path.display()))?;

    info!(
        "Dataset saved: {} ({} rows)",
        path.display(),
        df.height()
    );
    Ok(())
}
