//! Outlier handling module.
//!
//! Drops listings whose mileage or price is implausible for a used
//! vehicle. Thresholds are fixed.

use crate::error::Result;
use crate::utils::column_as_f64;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

/// Highest mileage kept (inclusive).
pub const MAX_MILEAGE: i64 = 500_000;

/// Prices at or below this are dropped.
pub const MIN_PRICE: f64 = 500.0;

/// Row counts around each predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub rows_before: usize,
    pub after_mileage: usize,
    pub after_price: usize,
}

impl FilterReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_before - self.after_price
    }
}

/// Handles outlier removal on the joined listings frame.
pub struct OutlierFilter;

impl OutlierFilter {
    /// Keep rows with `mileage <= 500000`, then rows with `listed_price > 500`.
    ///
    /// Rows with a null in the tested column are dropped.
    pub fn apply(df: &DataFrame) -> Result<(DataFrame, FilterReport)> {
        let rows_before = df.height();

        let mileage = column_as_f64(df, "mileage")?;
        let df = Self::keep(df, &mileage, |v| v <= MAX_MILEAGE as f64)?;
        let after_mileage = df.height();
        info!("After mileage filter: {} records", after_mileage);

        let price = column_as_f64(&df, "listed_price")?;
        let df = Self::keep(&df, &price, |v| v > MIN_PRICE)?;
        let after_price = df.height();
        info!("After price filter: {} records", after_price);

        Ok((
            df,
            FilterReport {
                rows_before,
                after_mileage,
                after_price,
            },
        ))
    }

    fn keep(
        df: &DataFrame,
        values: &[Option<f64>],
        predicate: impl Fn(f64) -> bool,
    ) -> Result<DataFrame> {
        let mask_values: Vec<bool> = values
            .iter()
            .map(|v| v.is_some_and(&predicate))
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &mask_values);
        Ok(df.filter(&mask)?)
    }
}
