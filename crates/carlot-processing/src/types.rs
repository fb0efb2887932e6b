use chrono::NaiveDate;
use polars::prelude::AnyValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for an absent make or location.
pub const UNKNOWN_PLACEHOLDER: &str = "Unknown";

/// A single raw cell from the source file, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    /// Any cell kind the cleaners have no rule for (booleans, dates, ...).
    Other,
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// The value as a string, if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&AnyValue<'_>> for RawValue {
    fn from(value: &AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => RawValue::Null,
            AnyValue::String(s) => RawValue::Text((*s).to_string()),
            AnyValue::StringOwned(s) => RawValue::Text(s.to_string()),
            AnyValue::Int8(v) => RawValue::Int(i64::from(*v)),
            AnyValue::Int16(v) => RawValue::Int(i64::from(*v)),
            AnyValue::Int32(v) => RawValue::Int(i64::from(*v)),
            AnyValue::Int64(v) => RawValue::Int(*v),
            AnyValue::UInt8(v) => RawValue::Int(i64::from(*v)),
            AnyValue::UInt16(v) => RawValue::Int(i64::from(*v)),
            AnyValue::UInt32(v) => RawValue::Int(i64::from(*v)),
            AnyValue::UInt64(v) => match i64::try_from(*v) {
                Ok(v) => RawValue::Int(v),
                Err(_) => RawValue::Float(*v as f64),
            },
            AnyValue::Float32(v) => RawValue::Float(f64::from(*v)),
            AnyValue::Float64(v) => RawValue::Float(*v),
            _ => RawValue::Other,
        }
    }
}

/// One row of the source file, restricted to the columns the pipeline reads.
#[derive(Debug, Clone, PartialEq)]
pub struct RawListingRecord {
    pub make: RawValue,
    pub model: RawValue,
    pub year: RawValue,
    pub mileage: RawValue,
    pub fuel_type: RawValue,
    pub transmission: RawValue,
    pub price: RawValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Hybrid,
    Electric,
    FlexFuel,
    Unknown,
}

impl FuelType {
    pub const ALL: [FuelType; 6] = [
        FuelType::Gasoline,
        FuelType::Diesel,
        FuelType::Hybrid,
        FuelType::Electric,
        FuelType::FlexFuel,
        FuelType::Unknown,
    ];

    /// Name used in the store and in output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gasoline => "gasoline",
            Self::Diesel => "diesel",
            Self::Hybrid => "hybrid",
            Self::Electric => "electric",
            Self::FlexFuel => "flex_fuel",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transmission {
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "automatic")]
    Automatic,
    #[serde(rename = "6_speed_at")]
    SixSpeedAt,
    #[serde(rename = "8_speed_automatic")]
    EightSpeedAutomatic,
    #[serde(rename = "7_speed_at")]
    SevenSpeedAt,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Transmission {
    pub const ALL: [Transmission; 6] = [
        Transmission::Manual,
        Transmission::Automatic,
        Transmission::SixSpeedAt,
        Transmission::EightSpeedAutomatic,
        Transmission::SevenSpeedAt,
        Transmission::Unknown,
    ];

    /// Name used in the store and in output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
            Self::SixSpeedAt => "6_speed_at",
            Self::EightSpeedAutomatic => "8_speed_automatic",
            Self::SevenSpeedAt => "7_speed_at",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub i64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub i64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vehicle attributes after cleaning, before the store assigns an id.
///
/// Equality covers every field; this is the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
    pub year: i64,
    pub engine_size_cc: Option<i64>,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
}

impl NewVehicle {
    pub fn into_vehicle(self, id: VehicleId) -> Vehicle {
        Vehicle {
            id,
            make: self.make,
            model: self.model,
            year: self.year,
            engine_size_cc: self.engine_size_cc,
            fuel_type: self.fuel_type,
            transmission: self.transmission,
        }
    }
}

/// A persisted vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub engine_size_cc: Option<i64>,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
}

impl Vehicle {
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            make: self.make.clone(),
            model: self.model.clone(),
            year: self.year,
        }
    }
}

/// `(make, model, year)` of a persisted vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
    pub make: String,
    pub model: String,
    pub year: i64,
}

/// `(make, model, year)` exactly as the source row carried them: no
/// placeholder for a missing make, no model truncation, no year default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceKey {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
}

impl SourceKey {
    /// The lookup key, or `None` if any component was absent in the source.
    pub fn to_natural_key(&self) -> Option<NaturalKey> {
        Some(NaturalKey {
            make: self.make.clone()?,
            model: self.model.clone()?,
            year: self.year?,
        })
    }
}

/// Listing attributes carried through ingestion until the vehicle is resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListingFields {
    pub mileage: i64,
    pub listed_price: f64,
}

/// A listing before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    /// `None` when the natural-key lookup found no unique vehicle.
    pub vehicle_id: Option<VehicleId>,
    pub location: String,
    pub listing_date: NaiveDate,
    pub listed_price: f64,
    pub mileage: i64,
}

impl NewListing {
    pub fn into_listing(self, id: ListingId) -> Listing {
        Listing {
            id,
            vehicle_id: self.vehicle_id,
            location: self.location,
            listing_date: self.listing_date,
            listed_price: self.listed_price,
            mileage: self.mileage,
        }
    }
}

/// A persisted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub vehicle_id: Option<VehicleId>,
    pub location: String,
    pub listing_date: NaiveDate,
    pub listed_price: f64,
    pub mileage: i64,
}
