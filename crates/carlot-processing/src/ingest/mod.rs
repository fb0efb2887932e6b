//! Ingestion run: source CSV to persisted vehicles and listings.
//!
//! Stages run in order over the whole batch:
//!
//! 1. [`read_listings_csv`] / [`raw_records`] - load the source rows
//! 2. [`clean_records`] - coerce mileage and price
//! 3. [`SchemaMapper`] - canonical vehicle and listing fields
//! 4. [`dedup_vehicles`] - drop exact-duplicate vehicles
//! 5. [`EntityStore::insert_vehicles`] - persist, ids assigned
//! 6. [`ReferentialResolver`] - link each row back to its vehicle
//! 7. [`EntityStore::insert_listings`] - persist one listing per row
//!
//! Any store failure aborts the run; nothing is retried.

mod reader;
mod resolver;

pub use reader::{raw_records, read_listings_as_text, read_listings_csv};
pub use resolver::{ReferentialResolver, Resolution, ResolutionReport};

use crate::cleaner::{SchemaMapper, clean_records, dedup_vehicles};
use crate::error::{Result, ResultExt};
use crate::reporting::{IngestionReport, timestamp};
use crate::store::EntityStore;
use crate::types::{Listing, RawListingRecord, Vehicle};
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Everything one ingestion run produced.
#[derive(Debug, Clone)]
pub struct IngestionOutcome {
    pub vehicles: Vec<Vehicle>,
    pub listings: Vec<Listing>,
    /// Per-row resolution, aligned with `listings`.
    pub resolutions: Vec<Resolution>,
    pub report: IngestionReport,
}

pub struct Ingestor {
    mapper: SchemaMapper,
    listing_date: NaiveDate,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl Ingestor {
    /// Ingestor stamping every listing with `listing_date`.
    pub fn new(listing_date: NaiveDate) -> Self {
        Self::with_mapper(SchemaMapper::default(), listing_date)
    }

    pub fn with_mapper(mapper: SchemaMapper, listing_date: NaiveDate) -> Self {
        Self {
            mapper,
            listing_date,
        }
    }

    /// Read `path` and ingest its rows into `store`.
    pub fn ingest_file<S: EntityStore + ?Sized>(
        &self,
        path: &Path,
        store: &mut S,
    ) -> Result<IngestionOutcome> {
        let df = read_listings_csv(path)?;
        let records = raw_records(&df).context(format!("Invalid input {}", path.display()))?;
        let mut outcome = self.ingest(&records, store)?;
        outcome.report.input_file = Some(path.display().to_string());
        Ok(outcome)
    }

    /// Ingest already-loaded source rows into `store`.
    pub fn ingest<S: EntityStore + ?Sized>(
        &self,
        records: &[RawListingRecord],
        store: &mut S,
    ) -> Result<IngestionOutcome> {
        let start = Instant::now();
        info!(
            "Ingesting {} records into {} store",
            records.len(),
            store.name()
        );

        let cleaned = clean_records(records);
        let mileage_defaulted = cleaned.iter().filter(|r| r.mileage_defaulted).count();
        let price_defaulted = cleaned.iter().filter(|r| r.price_defaulted).count();

        let (mapped, stats) = self.mapper.map(&cleaned);

        let drafts = dedup_vehicles(mapped.iter().map(|record| &record.vehicle));
        let duplicates_dropped = mapped.len() - drafts.len();

        let vehicles = store
            .insert_vehicles(&drafts)
            .context("Failed to insert vehicles")?;
        info!("Inserted {} vehicles", vehicles.len());

        let resolver = ReferentialResolver::new(
            store
                .natural_keys()
                .context("Failed to read vehicle keys")?,
        );
        let (drafts, resolutions) = resolver.build_listings(&mapped, self.listing_date);

        let listings = store
            .insert_listings(&drafts)
            .context("Failed to insert listings")?;
        info!("Inserted {} listings", listings.len());

        let report = IngestionReport {
            generated_at: timestamp(),
            input_file: None,
            store: store.name().to_string(),
            records_read: records.len(),
            mileage_defaulted,
            price_defaulted,
            truncated_models: stats.truncated_models,
            vehicles_inserted: vehicles.len(),
            duplicates_dropped,
            listings_inserted: listings.len(),
            resolution: ResolutionReport::from_resolutions(&resolutions),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        Ok(IngestionOutcome {
            vehicles,
            listings,
            resolutions,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{FuelType, RawValue, Transmission, VehicleId};
    use pretty_assertions::assert_eq;

    fn record(make: RawValue, model: &str, year: i64, mileage: &str, price: &str) -> RawListingRecord {
        RawListingRecord {
            make,
            model: RawValue::text(model),
            year: RawValue::Int(year),
            mileage: RawValue::text(mileage),
            fuel_type: RawValue::text("Gasoline"),
            transmission: RawValue::text("A/T"),
            price: RawValue::text(price),
        }
    }

    fn ingestor() -> Ingestor {
        Ingestor::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn test_price_noise_yields_one_vehicle_two_listings() {
        let records = vec![
            record(RawValue::text("Mazda"), "CX-5 Touring", 2019, "41,000 mi.", "$21,500"),
            record(RawValue::text("Mazda"), "CX-5 Touring", 2019, "41,000 mi.", "$21,750"),
        ];
        let mut store = MemoryStore::new();

        let outcome = ingestor().ingest(&records, &mut store).unwrap();

        assert_eq!(outcome.vehicles.len(), 1);
        assert_eq!(outcome.listings.len(), 2);
        let id = outcome.vehicles[0].id;
        assert!(outcome.listings.iter().all(|l| l.vehicle_id == Some(id)));
        assert_eq!(outcome.listings[1].listed_price, 21_750.0);
        assert_eq!(outcome.vehicles[0].fuel_type, FuelType::Gasoline);
        assert_eq!(outcome.vehicles[0].transmission, Transmission::Automatic);
        assert_eq!(outcome.report.duplicates_dropped, 1);
        assert_eq!(outcome.report.resolution.resolved, 2);
    }

    #[test]
    fn test_null_make_leaves_listing_unresolved() {
        let records = vec![record(RawValue::Null, "Model 3", 2021, "10 mi.", "$30,000")];
        let mut store = MemoryStore::new();

        let outcome = ingestor().ingest(&records, &mut store).unwrap();

        assert_eq!(outcome.vehicles[0].make, "Unknown");
        assert_eq!(outcome.listings[0].vehicle_id, None);
        assert_eq!(outcome.resolutions[0], Resolution::Unmatched);
        assert_eq!(outcome.report.resolution.unmatched, 1);
        assert!(store.joined_records().unwrap().is_empty());
    }

    #[test]
    fn test_second_run_makes_keys_ambiguous() {
        let records = vec![record(RawValue::text("Audi"), "A4", 2018, "60,000 mi.", "$18,000")];
        let mut store = MemoryStore::new();

        let first = ingestor().ingest(&records, &mut store).unwrap();
        assert_eq!(first.listings[0].vehicle_id, Some(VehicleId(1)));

        let second = ingestor().ingest(&records, &mut store).unwrap();
        assert_eq!(second.vehicles[0].id, VehicleId(2));
        assert_eq!(second.resolutions[0], Resolution::Ambiguous(2));
        assert_eq!(second.listings[0].vehicle_id, None);
    }

    #[test]
    fn test_defaulted_values_are_counted() {
        let records = vec![
            record(RawValue::text("Jeep"), "Wrangler", 2016, "", "$25,000"),
            record(RawValue::text("Jeep"), "Cherokee", 2017, "70,000 mi.", "call for price"),
        ];
        let mut store = MemoryStore::new();

        let report = ingestor().ingest(&records, &mut store).unwrap().report;

        assert_eq!(report.records_read, 2);
        assert_eq!(report.mileage_defaulted, 1);
        assert_eq!(report.price_defaulted, 1);
        assert_eq!(report.store, "memory");
        assert_eq!(report.input_file, None);
    }

    #[test]
    fn test_listing_date_is_stamped() {
        let records = vec![record(RawValue::text("Fiat"), "500", 2014, "80,000 mi.", "$5,000")];
        let mut store = MemoryStore::new();

        let outcome = ingestor().ingest(&records, &mut store).unwrap();
        assert_eq!(
            outcome.listings[0].listing_date,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert_eq!(outcome.listings[0].location, "Unknown");
    }
}
