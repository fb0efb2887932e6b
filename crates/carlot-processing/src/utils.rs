//! Shared utilities for the ingestion and ETL stages.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Read a numeric column as `f64` values, nulls preserved.
pub fn column_as_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let cast = df.column(name)?.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Read an integer column as `i64` values, nulls preserved.
pub fn column_as_i64(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let cast = df.column(name)?.cast(&DataType::Int64)?;
    Ok(cast.i64()?.into_iter().collect())
}

// =============================================================================
// String / Number Utilities
// =============================================================================

/// Keep at most `max_chars` characters of `s`.
///
/// Returns the (possibly shortened) string and whether anything was cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> (String, bool) {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (s[..byte_idx].to_string(), true),
        None => (s.to_string(), false),
    }
}

/// Round to two decimal places, the precision of a stored price.
#[inline]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("Camry", 100), ("Camry".to_string(), false));
        assert_eq!(truncate_chars("abcdef", 3), ("abc".to_string(), true));
        assert_eq!(truncate_chars("abc", 3), ("abc".to_string(), false));
        // multi-byte characters count once
        assert_eq!(truncate_chars("ééé", 2), ("éé".to_string(), true));
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(12500.5), 12500.5);
        assert_eq!(round_cents(499.999), 500.0);
        assert_eq!(round_cents(500.014), 500.01);
    }

    #[test]
    fn test_column_as_f64_casts_integers() {
        let df = df!["engine_size_cc" => [Some(1600i64), None, Some(2000)]].unwrap();
        let values = column_as_f64(&df, "engine_size_cc").unwrap();
        assert_eq!(values, vec![Some(1600.0), None, Some(2000.0)]);
    }
}
