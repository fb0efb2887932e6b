//! The joined vehicle/listing frame the ETL run works on.

use crate::error::Result;
use crate::types::{Listing, Vehicle};
use polars::prelude::*;

/// Columns of the joined frame, in order.
pub const JOINED_COLUMNS: [&str; 12] = [
    "car_id",
    "make",
    "model",
    "year",
    "engine_size_cc",
    "fuel_type",
    "transmission",
    "listing_id",
    "location",
    "listing_date",
    "listed_price",
    "mileage",
];

/// Columns of the written dataset, in order.
pub const OUTPUT_COLUMNS: [&str; 14] = [
    "car_id",
    "make",
    "model",
    "year",
    "engine_size_cc",
    "fuel_type",
    "transmission",
    "listing_id",
    "location",
    "listing_date",
    "listed_price",
    "mileage",
    "vehicle_age",
    "mileage_rate",
];

/// Build the joined frame from store records. Enum columns hold their wire
/// spelling.
pub fn joined_frame(records: &[(Vehicle, Listing)]) -> Result<DataFrame> {
    let vehicles = records.iter().map(|(v, _)| v);
    let listings = records.iter().map(|(_, l)| l);

    let car_id: Vec<i64> = vehicles.clone().map(|v| v.id.0).collect();
    let make: Vec<&str> = vehicles.clone().map(|v| v.make.as_str()).collect();
    let model: Vec<&str> = vehicles.clone().map(|v| v.model.as_str()).collect();
    let year: Vec<i64> = vehicles.clone().map(|v| v.year).collect();
    let engine_size_cc: Vec<Option<i64>> = vehicles.clone().map(|v| v.engine_size_cc).collect();
    let fuel_type: Vec<&str> = vehicles.clone().map(|v| v.fuel_type.as_str()).collect();
    let transmission: Vec<&str> = vehicles.map(|v| v.transmission.as_str()).collect();

    let listing_id: Vec<i64> = listings.clone().map(|l| l.id.0).collect();
    let location: Vec<&str> = listings.clone().map(|l| l.location.as_str()).collect();
    let listing_date =
        DateChunked::from_naive_date("listing_date".into(), listings.clone().map(|l| l.listing_date));
    let listed_price: Vec<f64> = listings.clone().map(|l| l.listed_price).collect();
    let mileage: Vec<i64> = listings.map(|l| l.mileage).collect();

    let df = DataFrame::new(vec![
        Column::new("car_id".into(), car_id),
        Column::new("make".into(), make),
        Column::new("model".into(), model),
        Column::new("year".into(), year),
        Column::new("engine_size_cc".into(), engine_size_cc),
        Column::new("fuel_type".into(), fuel_type),
        Column::new("transmission".into(), transmission),
        Column::new("listing_id".into(), listing_id),
        Column::new("location".into(), location),
        listing_date.into_column(),
        Column::new("listed_price".into(), listed_price),
        Column::new("mileage".into(), mileage),
    ])?;
    Ok(df)
}
