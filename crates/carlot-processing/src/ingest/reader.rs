//! Loading the source listings file.

use crate::cleaner::COLUMN_MAPPING;
use crate::error::{PipelineError, Result, ResultExt};
use crate::types::{RawListingRecord, RawValue};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Read the source CSV, keeping only the mapped source columns.
///
/// Column types are inferred from the whole file. If inference fails (a
/// column that looks numeric early on turns textual later), the file is
/// re-read with every column as text; the cleaners handle both forms.
pub fn read_listings_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file not found: {}", path.display()),
        )));
    }
    info!("Reading listings from: {}", path.display());

    check_header(path)?;

    match CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_columns(Some(source_columns()))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Typed loading failed, retrying as text: {}", e);
        }
    }

    read_listings_as_text(path)
}

/// Read the mapped source columns with every cell kept as text.
pub fn read_listings_as_text(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_columns(Some(source_columns()))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .context(format!("Failed to read {}", path.display()))
}

fn source_columns() -> Arc<[PlSmallStr]> {
    COLUMN_MAPPING
        .iter()
        .map(|(source, _)| PlSmallStr::from(*source))
        .collect()
}

/// Fail with the first mapped column the header lacks.
fn check_header(path: &Path) -> Result<()> {
    let header = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_n_rows(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .context(format!("Failed to read header of {}", path.display()))?;

    let names = header.get_column_names();
    match COLUMN_MAPPING
        .iter()
        .find(|(source, _)| !names.iter().any(|name| name.as_str() == *source))
    {
        Some((source, _)) => Err(PipelineError::ColumnNotFound(source.to_string())),
        None => Ok(()),
    }
}

/// Extract the columns the pipeline uses, one record per row.
///
/// Extra columns are ignored; a missing source column is an error.
pub fn raw_records(df: &DataFrame) -> Result<Vec<RawListingRecord>> {
    let mut columns = Vec::with_capacity(COLUMN_MAPPING.len());
    for (source, _) in COLUMN_MAPPING {
        let column = df
            .column(source)
            .map_err(|_| PipelineError::ColumnNotFound(source.to_string()))?;
        columns.push(column.as_materialized_series());
    }
    debug!("Source columns: {:?}", df.get_column_names());

    let cell = |col: usize, row: usize| -> Result<RawValue> {
        Ok(RawValue::from(&columns[col].get(row)?))
    };

    (0..df.height())
        .map(|row| {
            Ok(RawListingRecord {
                make: cell(0, row)?,
                model: cell(1, row)?,
                year: cell(2, row)?,
                mileage: cell(3, row)?,
                fuel_type: cell(4, row)?,
                transmission: cell(5, row)?,
                price: cell(6, row)?,
            })
        })
        .collect()
}
