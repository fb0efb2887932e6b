//! Ingestion-time cleaning stages.
//!
//! Each stage is a pure function over an immutable slice:
//! - [`values`]: coerce mileage and price to numbers
//! - [`canonical`]: map fuel type and transmission onto closed enums
//! - [`schema`]: rename, default and truncate into the canonical fields
//! - [`dedup`]: drop exact-duplicate vehicles before persistence

pub mod canonical;
pub mod dedup;
pub mod schema;
pub mod values;

pub use canonical::{Canonicalizer, FUEL_TYPE_TABLE, TRANSMISSION_TABLE};
pub use dedup::dedup_vehicles;
pub use schema::{COLUMN_MAPPING, MAX_MODEL_LEN, MappedRecord, MappingStats, SchemaMapper};
pub use values::{
    Cleaned, CleanedRecord, clean_mileage, clean_mileage_checked, clean_price,
    clean_price_checked, clean_records,
};
