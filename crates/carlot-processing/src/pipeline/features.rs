//! Derived columns for the analysis dataset.

use crate::error::Result;
use crate::utils::column_as_i64;
use chrono::{Datelike, Local};
use polars::prelude::*;
use tracing::debug;

/// Adds `vehicle_age` and `mileage_rate`.
pub struct FeatureEngineer {
    current_year: i32,
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new(Local::now().year())
    }
}

impl FeatureEngineer {
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// `current_year - year`, with 0 raised to 1 so the rate stays finite.
    /// Negative ages (model years in the future) are kept.
    pub fn vehicle_age(&self, year: i64) -> i64 {
        match i64::from(self.current_year).saturating_sub(year) {
            0 => 1,
            age => age,
        }
    }

    /// Append the derived columns to `df`.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let years = column_as_i64(df, "year")?;
        let mileages = column_as_i64(df, "mileage")?;

        let ages: Vec<Option<i64>> = years.iter().map(|y| y.map(|y| self.vehicle_age(y))).collect();
        let rates: Vec<Option<f64>> = ages
            .iter()
            .zip(&mileages)
            .map(|(age, mileage)| match (age, mileage) {
                (Some(age), Some(mileage)) => Some(*mileage as f64 / *age as f64),
                _ => None,
            })
            .collect();

        let mut result = df.clone();
        result.with_column(Column::new("vehicle_age".into(), ages))?;
        result.with_column(Column::new("mileage_rate".into(), rates))?;
        debug!(
            "Derived vehicle_age and mileage_rate for {} rows (current year {})",
            result.height(),
            self.current_year
        );
        Ok(result)
    }
}
