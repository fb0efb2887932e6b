//! Mapping of cleaned source rows onto the canonical vehicle/listing fields.

use super::canonical::Canonicalizer;
use super::values::CleanedRecord;
use crate::types::{ListingFields, NewVehicle, RawValue, SourceKey, UNKNOWN_PLACEHOLDER};
use crate::utils::truncate_chars;
use tracing::warn;

/// Source column name and the canonical field it becomes.
pub const COLUMN_MAPPING: [(&str, &str); 7] = [
    ("brand", "make"),
    ("model", "model"),
    ("model_year", "year"),
    ("milage", "mileage"),
    ("fuel_type", "fuel_type"),
    ("transmission", "transmission"),
    ("price", "listed_price"),
];

/// Longest model name the `cars` table accepts.
pub const MAX_MODEL_LEN: usize = 100;

/// Engine size assigned at creation; the source carries none.
pub const INITIAL_ENGINE_SIZE_CC: i64 = 0;

/// Canonical projection of one source row.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    pub vehicle: NewVehicle,
    pub listing: ListingFields,
    /// Natural key as read from the source, used for resolution.
    pub source_key: SourceKey,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
    pub truncated_models: usize,
}

pub struct SchemaMapper {
    canonicalizer: Canonicalizer,
}

impl Default for SchemaMapper {
    fn default() -> Self {
        Self::new(Canonicalizer::default())
    }
}

impl SchemaMapper {
    pub fn new(canonicalizer: Canonicalizer) -> Self {
        Self { canonicalizer }
    }

    pub fn map(&self, records: &[CleanedRecord]) -> (Vec<MappedRecord>, MappingStats) {
        let mut stats = MappingStats::default();
        let mapped = records
            .iter()
            .map(|record| {
                let (model, truncated) = truncate_chars(&text_of(&record.model), MAX_MODEL_LEN);
                if truncated {
                    stats.truncated_models += 1;
                    warn!(
                        "Model name longer than {} characters truncated: {}",
                        MAX_MODEL_LEN, model
                    );
                }

                let vehicle = NewVehicle {
                    make: if record.make.is_null() {
                        UNKNOWN_PLACEHOLDER.to_string()
                    } else {
                        text_of(&record.make)
                    },
                    model,
                    year: year_of(&record.year).unwrap_or(0),
                    engine_size_cc: Some(INITIAL_ENGINE_SIZE_CC),
                    fuel_type: self
                        .canonicalizer
                        .fuel_type(lookup_text(&record.fuel_type).as_deref()),
                    transmission: self
                        .canonicalizer
                        .transmission(lookup_text(&record.transmission).as_deref()),
                };

                MappedRecord {
                    vehicle,
                    listing: record.listing,
                    source_key: source_key_of(record),
                }
            })
            .collect();

        (mapped, stats)
    }
}

/// Display form of a cell; nulls become the empty string.
fn text_of(value: &RawValue) -> String {
    match value {
        RawValue::Text(s) => s.clone(),
        RawValue::Int(v) => v.to_string(),
        RawValue::Float(v) if !v.is_nan() => v.to_string(),
        _ => String::new(),
    }
}

/// The spelling handed to the canonicalizer, `None` for an absent value.
fn lookup_text(value: &RawValue) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(text_of(value))
    }
}

/// Integer reading of a year cell. Text is parsed after trimming.
fn year_of(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Int(v) => Some(*v),
        RawValue::Float(v) if v.is_finite() => Some(v.trunc() as i64),
        RawValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The natural key exactly as the source row carried it.
///
/// Only textual make/model and whole-number years count, whether the year
/// was read as a number or as digits in text. Nothing is defaulted or
/// truncated here, so rows whose stored vehicle differs from the source
/// spelling will not find it again.
fn source_key_of(record: &CleanedRecord) -> SourceKey {
    let year = match &record.year {
        RawValue::Int(v) => Some(*v),
        RawValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        RawValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    };
    SourceKey {
        make: record.make.as_text().map(str::to_string),
        model: record.model.as_text().map(str::to_string),
        year,
    }
}
