//! Integration tests for the ingestion and ETL runs.
//!
//! These tests drive both runs end to end over a small listings sample,
//! against the in-memory store and a SQLite file.

use carlot_processing::pipeline::OUTPUT_COLUMNS;
use carlot_processing::{
    EntityStore, EtlPipeline, FuelType, Ingestor, MemoryStore, NewListing, NewVehicle,
    Resolution, ResolutionReport, SqliteStore, Transmission,
};
use chrono::NaiveDate;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn sample_path() -> PathBuf {
    fixtures_path().join("used_cars_sample.csv")
}

fn ingestor() -> Ingestor {
    Ingestor::new(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
}

fn load_csv(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

fn vehicle(model: &str, engine_size_cc: Option<i64>) -> NewVehicle {
    NewVehicle {
        make: "Volvo".to_string(),
        model: model.to_string(),
        year: 2018,
        engine_size_cc,
        fuel_type: FuelType::Diesel,
        transmission: Transmission::Automatic,
    }
}

// ============================================================================
// Ingestion
// ============================================================================

#[test]
fn test_ingest_sample_into_memory_store() {
    let mut store = MemoryStore::new();
    let outcome = ingestor().ingest_file(&sample_path(), &mut store).unwrap();
    let report = &outcome.report;

    assert_eq!(report.records_read, 11);
    assert_eq!(report.vehicles_inserted, 10);
    assert_eq!(report.duplicates_dropped, 1);
    assert_eq!(report.listings_inserted, 11);
    assert_eq!(report.truncated_models, 1);
    assert_eq!(report.mileage_defaulted, 0);
    assert_eq!(report.price_defaulted, 0);
    assert_eq!(
        report.resolution,
        ResolutionReport {
            resolved: 9,
            unmatched: 2,
            ambiguous: 0,
        }
    );
    assert!(report.input_file.as_deref().unwrap().ends_with("used_cars_sample.csv"));
}

#[test]
fn test_ingest_canonicalizes_vehicles() {
    let mut store = MemoryStore::new();
    ingestor().ingest_file(&sample_path(), &mut store).unwrap();
    let vehicles = store.vehicles();

    let ford = &vehicles[0];
    assert_eq!(ford.make, "Ford");
    assert_eq!(ford.year, 2013);
    assert_eq!(ford.fuel_type, FuelType::FlexFuel);
    assert_eq!(ford.transmission, Transmission::SixSpeedAt);
    assert_eq!(ford.engine_size_cc, Some(0));

    let tesla = vehicles.iter().find(|v| v.make == "Tesla").unwrap();
    assert_eq!(tesla.fuel_type, FuelType::Unknown);
    assert_eq!(tesla.transmission, Transmission::Automatic);

    let chevrolet = vehicles.iter().find(|v| v.make == "Chevrolet").unwrap();
    assert_eq!(chevrolet.model.chars().count(), 100);

    assert!(vehicles.iter().any(|v| v.make == "Unknown" && v.model == "Model S P100D"));
}

#[test]
fn test_price_noise_listings_share_one_vehicle() {
    let mut store = MemoryStore::new();
    let outcome = ingestor().ingest_file(&sample_path(), &mut store).unwrap();

    let audi_ids: Vec<_> = outcome.vehicles.iter().filter(|v| v.make == "Audi").map(|v| v.id).collect();
    assert_eq!(audi_ids.len(), 1);

    let audi_listings: Vec<_> = outcome
        .listings
        .iter()
        .filter(|l| l.vehicle_id == Some(audi_ids[0]))
        .collect();
    assert_eq!(audi_listings.len(), 2);
    assert_eq!(audi_listings[0].listed_price, 34_999.0);
    assert_eq!(audi_listings[1].listed_price, 35_499.0);
    assert_eq!(audi_listings[0].mileage, 9_835);
}

#[test]
fn test_unresolvable_rows_keep_listing_without_vehicle() {
    let mut store = MemoryStore::new();
    let outcome = ingestor().ingest_file(&sample_path(), &mut store).unwrap();

    // Rows 10 (no make) and 11 (model over 100 characters).
    assert_eq!(outcome.resolutions[9], Resolution::Unmatched);
    assert_eq!(outcome.resolutions[10], Resolution::Unmatched);
    assert_eq!(outcome.listings[9].vehicle_id, None);
    assert_eq!(outcome.listings[10].vehicle_id, None);
    assert_eq!(outcome.listings[9].listed_price, 60_000.0);

    assert_eq!(store.joined_records().unwrap().len(), 9);
}

#[test]
fn test_missing_source_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("incomplete.csv");
    std::fs::write(&path, "brand,model,model_year,price\nFord,F-150,2019,\"$30,000\"\n").unwrap();

    let mut store = MemoryStore::new();
    let err = ingestor().ingest_file(&path, &mut store).unwrap_err();

    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    assert!(store.vehicles().is_empty());
}

// ============================================================================
// ETL
// ============================================================================

#[test]
fn test_etl_over_memory_store() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("processed").join("cleaned_car_data.csv");

    let mut store = MemoryStore::new();
    ingestor().ingest_file(&sample_path(), &mut store).unwrap();
    let report = EtlPipeline::new(2024).run(&store, &output).unwrap();

    assert_eq!(report.rows_loaded, 9);
    assert_eq!(report.filter.after_mileage, 8);
    assert_eq!(report.filter.after_price, 7);
    assert_eq!(report.rows_written, 7);
    assert_eq!(report.imputation.imputed, 0);
    assert_eq!(report.columns, OUTPUT_COLUMNS.map(String::from).to_vec());

    let df = load_csv(&output);
    assert_eq!(column_names(&df), OUTPUT_COLUMNS.map(String::from).to_vec());
    assert_eq!(df.height(), 7);

    let makes: Vec<Option<&str>> = df.column("make").unwrap().str().unwrap().into_iter().collect();
    assert!(!makes.contains(&Some("Toyota")));
    assert!(!makes.contains(&Some("Honda")));
    assert!(!makes.contains(&Some("Unknown")));
}

#[test]
fn test_etl_derives_age_and_rate() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cleaned.csv");

    let mut store = MemoryStore::new();
    ingestor().ingest_file(&sample_path(), &mut store).unwrap();
    EtlPipeline::new(2024).run(&store, &output).unwrap();

    let df = load_csv(&output);
    let tesla = df
        .clone()
        .lazy()
        .filter(col("make").eq(lit("Tesla")))
        .collect()
        .unwrap();
    assert_eq!(tesla.height(), 1);
    assert_eq!(tesla.column("vehicle_age").unwrap().i64().unwrap().get(0), Some(1));
    assert_eq!(
        tesla.column("mileage_rate").unwrap().f64().unwrap().get(0),
        Some(12_000.0)
    );

    let ford = df
        .lazy()
        .filter(col("make").eq(lit("Ford")))
        .collect()
        .unwrap();
    assert_eq!(ford.column("vehicle_age").unwrap().i64().unwrap().get(0), Some(11));
    assert_eq!(
        ford.column("listing_date").unwrap().str().unwrap().get(0),
        Some("2024-09-01")
    );
}

#[test]
fn test_etl_imputes_missing_engine_sizes_with_mean() {
    let known = [1200, 1400, 1600, 1800, 2000, 2200, 2400, 3000];
    let mut drafts: Vec<NewVehicle> = known
        .iter()
        .enumerate()
        .map(|(i, &cc)| vehicle(&format!("V{}", i), Some(cc)))
        .collect();
    drafts.push(vehicle("V8", None));
    drafts.push(vehicle("V9", None));

    let mut store = MemoryStore::new();
    let vehicles = store.insert_vehicles(&drafts).unwrap();
    let listings: Vec<NewListing> = vehicles
        .iter()
        .map(|v| NewListing {
            vehicle_id: Some(v.id),
            location: "Unknown".to_string(),
            listing_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            listed_price: 20_000.0,
            mileage: 60_000,
        })
        .collect();
    store.insert_listings(&listings).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("imputed.csv");
    let report = EtlPipeline::new(2024).run(&store, &output).unwrap();

    assert_eq!(report.imputation.imputed, 2);
    let mean = known.iter().sum::<i64>() as f64 / known.len() as f64;

    let df = load_csv(&output);
    let sizes = df.column("engine_size_cc").unwrap().f64().unwrap().to_vec();
    assert_eq!(sizes[8], Some(mean));
    assert_eq!(sizes[9], Some(mean));
    assert_eq!(sizes[0], Some(1200.0));
}

// ============================================================================
// SQLite end to end
// ============================================================================

#[test]
fn test_sqlite_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("used_cars.db");
    let output = dir.path().join("out").join("cleaned_car_data.csv");

    {
        let mut store = SqliteStore::open(&db_path).unwrap();
        store.provision().unwrap();
        let outcome = ingestor().ingest_file(&sample_path(), &mut store).unwrap();
        assert_eq!(outcome.report.store, "sqlite");
        assert_eq!(outcome.report.resolution.resolved, 9);
    }

    // A fresh connection sees what the ingestion run committed.
    let store = SqliteStore::open(&db_path).unwrap();
    let report = EtlPipeline::new(2024).run(&store, &output).unwrap();
    assert_eq!(report.rows_loaded, 9);
    assert_eq!(report.rows_written, 7);

    let df = load_csv(&output);
    assert_eq!(column_names(&df), OUTPUT_COLUMNS.map(String::from).to_vec());
    let listing_ids = df.column("listing_id").unwrap().i64().unwrap().to_vec();
    let mut sorted = listing_ids.clone();
    sorted.sort();
    assert_eq!(listing_ids, sorted);
}

#[test]
fn test_sqlite_second_ingestion_leaves_listings_unresolved() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = SqliteStore::open(dir.path().join("used_cars.db")).unwrap();
    store.provision().unwrap();

    ingestor().ingest_file(&sample_path(), &mut store).unwrap();
    let second = ingestor().ingest_file(&sample_path(), &mut store).unwrap();

    assert_eq!(
        second.report.resolution,
        ResolutionReport {
            resolved: 0,
            unmatched: 2,
            ambiguous: 9,
        }
    );
    assert_eq!(store.natural_keys().unwrap().len(), 20);
    assert_eq!(store.joined_records().unwrap().len(), 9);
}

#[test]
fn test_ingest_into_unprovisioned_sqlite_fails() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let err = ingestor().ingest_file(&sample_path(), &mut store).unwrap_err();
    assert!(err.is_store_failure());
}
