//! Value cleaners for the mileage and price fields.
//!
//! Both cleaners are total: every input maps to a number. Nulls, unparseable
//! text and cell kinds with no rule become `0` / `0.0`.

use crate::types::{ListingFields, RawListingRecord, RawValue};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9]").expect("Invalid regex: non-digits"));
static NON_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9.]").expect("Invalid regex: non-decimal"));

/// A cleaned value and whether it came from the fallback default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cleaned<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Cleaned<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    fn default_to(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

/// Coerce a raw mileage cell to an integer.
///
/// `"45,231 mi."` -> `45231`, `45231.9` -> `45231`, null -> `0`.
pub fn clean_mileage(value: &RawValue) -> i64 {
    clean_mileage_checked(value).value
}

/// Like [`clean_mileage`], also reporting whether the default was used.
pub fn clean_mileage_checked(value: &RawValue) -> Cleaned<i64> {
    match value {
        RawValue::Null => Cleaned::default_to(0),
        RawValue::Int(v) => Cleaned::clean(*v),
        // `as` saturates; non-finite floats have no integer reading
        RawValue::Float(v) if v.is_finite() => Cleaned::clean(v.trunc() as i64),
        RawValue::Float(_) => Cleaned::default_to(0),
        RawValue::Text(s) => {
            let digits = NON_DIGITS.replace_all(s, "");
            if digits.is_empty() {
                return Cleaned::default_to(0);
            }
            match digits.parse::<i64>() {
                Ok(v) => Cleaned::clean(v),
                Err(_) => Cleaned::default_to(0),
            }
        }
        RawValue::Other => Cleaned::default_to(0),
    }
}

/// Coerce a raw price cell to a float.
///
/// `"$12,500.50"` -> `12500.5`, `15000` -> `15000.0`, null -> `0.0`.
pub fn clean_price(value: &RawValue) -> f64 {
    clean_price_checked(value).value
}

/// Like [`clean_price`], also reporting whether the default was used.
pub fn clean_price_checked(value: &RawValue) -> Cleaned<f64> {
    match value {
        RawValue::Null => Cleaned::default_to(0.0),
        RawValue::Int(v) => Cleaned::clean(*v as f64),
        RawValue::Float(v) if v.is_nan() => Cleaned::default_to(0.0),
        RawValue::Float(v) => Cleaned::clean(*v),
        RawValue::Text(s) => {
            let kept = NON_DECIMAL.replace_all(s, "");
            if kept.is_empty() {
                return Cleaned::default_to(0.0);
            }
            // "1.2.3" or a lone "." survive the filter but are not numbers
            match kept.parse::<f64>() {
                Ok(v) => Cleaned::clean(v),
                Err(_) => Cleaned::default_to(0.0),
            }
        }
        RawValue::Other => Cleaned::default_to(0.0),
    }
}

/// A source row with mileage and price coerced; other fields still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub make: RawValue,
    pub model: RawValue,
    pub year: RawValue,
    pub fuel_type: RawValue,
    pub transmission: RawValue,
    pub listing: ListingFields,
    pub mileage_defaulted: bool,
    pub price_defaulted: bool,
}

/// Apply the mileage and price cleaners to every record.
pub fn clean_records(records: &[RawListingRecord]) -> Vec<CleanedRecord> {
    records
        .iter()
        .map(|record| {
            let mileage = clean_mileage_checked(&record.mileage);
            let price = clean_price_checked(&record.price);
            CleanedRecord {
                make: record.make.clone(),
                model: record.model.clone(),
                year: record.year.clone(),
                fuel_type: record.fuel_type.clone(),
                transmission: record.transmission.clone(),
                listing: ListingFields {
                    mileage: mileage.value,
                    listed_price: price.value,
                },
                mileage_defaulted: mileage.defaulted,
                price_defaulted: price.defaulted,
            }
        })
        .collect()
}
