//! Configuration for the ingestion and ETL runs.
//!
//! Paths come from the builder, or from `CARLOT_*` environment variables
//! (a `.env` file is honoured) via [`PipelineConfig::from_env`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_INPUT_PATH: &str = "CARLOT_INPUT_PATH";
pub const ENV_OUTPUT_PATH: &str = "CARLOT_OUTPUT_PATH";
pub const ENV_DATABASE_PATH: &str = "CARLOT_DATABASE_PATH";

pub const DEFAULT_INPUT_PATH: &str = "data/raw/used_cars.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/processed/cleaned_car_data.csv";
pub const DEFAULT_DATABASE_PATH: &str = "data/used_cars.db";

/// Configuration shared by the `setup`, `ingest` and `etl` runs.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use carlot_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .input_path("data/raw/used_cars.csv")
///     .database_path("data/used_cars.db")
///     .current_year(2024)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Source listings CSV read by ingestion.
    /// Default: "data/raw/used_cars.csv"
    pub input_path: PathBuf,

    /// Analysis dataset written by the ETL run.
    /// Default: "data/processed/cleaned_car_data.csv"
    pub output_path: PathBuf,

    /// SQLite database holding vehicles and listings.
    /// Default: "data/used_cars.db"
    pub database_path: PathBuf,

    /// Date stamped on ingested listings. Today if None.
    pub listing_date: Option<NaiveDate>,

    /// Year vehicle age is computed against. The current year if None.
    pub current_year: Option<i32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            listing_date: None,
            current_year: None,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Builder seeded from the process environment, after loading `.env`.
    pub fn from_env() -> PipelineConfigBuilder {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builder seeded from `lookup`, which maps variable names to values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PipelineConfigBuilder {
        let mut builder = Self::builder();
        if let Some(path) = lookup(ENV_INPUT_PATH) {
            builder = builder.input_path(path);
        }
        if let Some(path) = lookup(ENV_OUTPUT_PATH) {
            builder = builder.output_path(path);
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            builder = builder.database_path(path);
        }
        builder
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, path) in [
            ("input_path", &self.input_path),
            ("output_path", &self.output_path),
            ("database_path", &self.database_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigValidationError::EmptyPath(field.to_string()));
            }
        }

        if self.output_path == self.input_path {
            return Err(ConfigValidationError::OutputOverwritesInput(
                self.output_path.clone(),
            ));
        }

        if let Some(year) = self.current_year
            && !(1886..=9999).contains(&year)
        {
            return Err(ConfigValidationError::InvalidYear(year));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Path for '{0}' must not be empty")]
    EmptyPath(String),

    #[error("Output path {0:?} would overwrite the input file")]
    OutputOverwritesInput(PathBuf),

    #[error("Invalid current year: {0} (must be between 1886 and 9999)")]
    InvalidYear(i32),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    database_path: Option<PathBuf>,
    listing_date: Option<NaiveDate>,
    current_year: Option<i32>,
}

impl PipelineConfigBuilder {
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Stamp ingested listings with `date` instead of today.
    pub fn listing_date(mut self, date: NaiveDate) -> Self {
        self.listing_date = Some(date);
        self
    }

    /// Compute vehicle age against `year` instead of the current year.
    pub fn current_year(mut self, year: i32) -> Self {
        self.current_year = Some(year);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            input_path: self
                .input_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH)),
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            database_path: self
                .database_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            listing_date: self.listing_date,
            current_year: self.current_year,
        };

        config.validate()?;
        Ok(config)
    }
}
