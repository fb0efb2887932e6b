//! SQLite-backed entity store.

use super::EntityStore;
use crate::error::{PipelineError, Result, ResultExt};
use crate::types::{
    FuelType, Listing, ListingId, NaturalKey, NewListing, NewVehicle, Transmission, Vehicle,
    VehicleId,
};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cars (
    car_id INTEGER PRIMARY KEY AUTOINCREMENT,
    make TEXT NOT NULL DEFAULT 'Unknown',
    model TEXT NOT NULL CHECK (length(model) <= 100),
    year INTEGER NULL,
    engine_size_cc INTEGER NULL,
    fuel_type TEXT NOT NULL DEFAULT 'unknown' CHECK (fuel_type IN (
        'gasoline', 'diesel', 'hybrid', 'electric', 'flex_fuel', 'unknown'
    )),
    transmission TEXT NOT NULL DEFAULT 'unknown' CHECK (transmission IN (
        'manual', 'automatic', '6_speed_at', '8_speed_automatic', '7_speed_at', 'unknown'
    ))
);

CREATE TABLE IF NOT EXISTS listings (
    listing_id INTEGER PRIMARY KEY AUTOINCREMENT,
    car_id INTEGER NULL REFERENCES cars (car_id),
    location TEXT NOT NULL DEFAULT 'Unknown',
    listing_date TEXT NOT NULL,
    listed_price REAL NOT NULL,
    mileage INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS economic_indicators (
    region TEXT NOT NULL,
    date TEXT NOT NULL,
    median_income REAL,
    unemployment_rate REAL,
    PRIMARY KEY (region, date)
);

CREATE INDEX IF NOT EXISTS idx_listing_date ON listings (listing_date);
CREATE INDEX IF NOT EXISTS idx_make_model ON cars (make, model);
";

const DROP_SCHEMA: &str = "
DROP TABLE IF EXISTS listings;
DROP TABLE IF EXISTS cars;
DROP TABLE IF EXISTS economic_indicators;
";

const JOINED_QUERY: &str = "
SELECT c.car_id, c.make, c.model, c.year, c.engine_size_cc, c.fuel_type, c.transmission,
       l.listing_id, l.location, l.listing_date, l.listed_price, l.mileage
FROM cars c
JOIN listings l ON c.car_id = l.car_id
ORDER BY l.listing_id
";

/// Store backed by a SQLite database.
///
/// The listing `car_id` column is nullable: listings whose vehicle could not
/// be resolved are stored with a NULL reference.
pub struct SqliteStore {
    conn: Connection,
    label: String,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .context(format!("Failed to open entity store at {}", path.display()))?;
        Self::with_connection(conn, path.display().to_string())
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::with_connection(conn, ":memory:".to_string())
    }

    fn with_connection(conn: Connection, label: String) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, label })
    }

    /// Create the tables and indexes if they do not exist.
    pub fn provision(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to provision schema")?;
        info!("Provisioned cars, listings and economic_indicators in {}", self.label);
        Ok(())
    }

    /// Drop every table, then provision from scratch.
    pub fn reset(&self) -> Result<()> {
        self.conn
            .execute_batch(DROP_SCHEMA)
            .context("Failed to drop existing schema")?;
        debug!("Dropped existing tables in {}", self.label);
        self.provision()
    }

    /// Names of the tables currently present.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Columns of one joined row before the enum columns are validated.
type JoinedRow = (
    i64,
    String,
    String,
    Option<i64>,
    Option<i64>,
    String,
    String,
    i64,
    String,
    NaiveDate,
    f64,
    i64,
);

fn parse_fuel_type(value: &str) -> Result<FuelType> {
    FuelType::from_wire(value)
        .ok_or_else(|| PipelineError::Store(format!("Invalid fuel_type in cars table: {value}")))
}

fn parse_transmission(value: &str) -> Result<Transmission> {
    Transmission::from_wire(value).ok_or_else(|| {
        PipelineError::Store(format!("Invalid transmission in cars table: {value}"))
    })
}

impl EntityStore for SqliteStore {
    fn insert_vehicles(&mut self, vehicles: &[NewVehicle]) -> Result<Vec<Vehicle>> {
        let tx = self.conn.transaction()?;
        let mut inserted = Vec::with_capacity(vehicles.len());
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO cars (make, model, year, engine_size_cc, fuel_type, transmission)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for vehicle in vehicles {
                stmt.execute(params![
                    vehicle.make,
                    vehicle.model,
                    vehicle.year,
                    vehicle.engine_size_cc,
                    vehicle.fuel_type.as_str(),
                    vehicle.transmission.as_str(),
                ])
                .context("Failed to insert into cars")?;
                let id = VehicleId(tx.last_insert_rowid());
                inserted.push(vehicle.clone().into_vehicle(id));
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn natural_keys(&self) -> Result<Vec<(VehicleId, NaturalKey)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT car_id, make, model, year FROM cars ORDER BY car_id")?;
        let keys = stmt
            .query_map([], |row| {
                Ok((
                    VehicleId(row.get(0)?),
                    NaturalKey {
                        make: row.get(1)?,
                        model: row.get(2)?,
                        year: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                    },
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn insert_listings(&mut self, listings: &[NewListing]) -> Result<Vec<Listing>> {
        let tx = self.conn.transaction()?;
        let mut inserted = Vec::with_capacity(listings.len());
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO listings (car_id, location, listing_date, listed_price, mileage)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for listing in listings {
                stmt.execute(params![
                    listing.vehicle_id.map(|id| id.0),
                    listing.location,
                    listing.listing_date,
                    listing.listed_price,
                    listing.mileage,
                ])
                .context("Failed to insert into listings")?;
                let id = ListingId(tx.last_insert_rowid());
                inserted.push(listing.clone().into_listing(id));
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn joined_records(&self) -> Result<Vec<(Vehicle, Listing)>> {
        let mut stmt = self.conn.prepare(JOINED_QUERY)?;
        let rows: Vec<JoinedRow> = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                ))
            })?
            .collect::<std::result::Result<Vec<JoinedRow>, _>>()
            .context("Failed to load joined vehicle/listing view")?;

        rows.into_iter()
            .map(
                |(
                    car_id,
                    make,
                    model,
                    year,
                    engine_size_cc,
                    fuel_type,
                    transmission,
                    listing_id,
                    location,
                    listing_date,
                    listed_price,
                    mileage,
                )|
                 -> Result<(Vehicle, Listing)> {
                    let vehicle = Vehicle {
                        id: VehicleId(car_id),
                        make,
                        model,
                        year: year.unwrap_or(0),
                        engine_size_cc,
                        fuel_type: parse_fuel_type(&fuel_type)?,
                        transmission: parse_transmission(&transmission)?,
                    };
                    let listing = Listing {
                        id: ListingId(listing_id),
                        vehicle_id: Some(vehicle.id),
                        location,
                        listing_date,
                        listed_price,
                        mileage,
                    };
                    Ok((vehicle, listing))
                },
            )
            .collect()
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.provision().unwrap();
        store
    }

    fn new_vehicle(make: &str, model: &str, year: i64) -> NewVehicle {
        NewVehicle {
            make: make.to_string(),
            model: model.to_string(),
            year,
            engine_size_cc: Some(0),
            fuel_type: FuelType::FlexFuel,
            transmission: Transmission::SevenSpeedAt,
        }
    }

    fn new_listing(vehicle_id: Option<VehicleId>, price: f64) -> NewListing {
        NewListing {
            vehicle_id,
            location: "Unknown".to_string(),
            listing_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            listed_price: price,
            mileage: 42_000,
        }
    }

    #[test]
    fn test_provision_creates_all_tables() {
        let store = store();
        let tables = store.table_names().unwrap();
        for table in ["cars", "listings", "economic_indicators"] {
            assert!(tables.iter().any(|t| t == table), "missing {table}");
        }
    }

    #[test]
    fn test_provision_is_repeatable() {
        let store = store();
        store.provision().unwrap();
        store.reset().unwrap();
        assert!(store.table_names().unwrap().contains(&"cars".to_string()));
    }

    #[test]
    fn test_round_trip_joined_view() {
        let mut store = store();
        let vehicles = store
            .insert_vehicles(&[
                new_vehicle("Chevrolet", "Silverado 1500", 2019),
                new_vehicle("Jeep", "Wrangler", 2021),
            ])
            .unwrap();
        assert_eq!(vehicles[0].id, VehicleId(1));
        assert_eq!(vehicles[1].id, VehicleId(2));

        store
            .insert_listings(&[
                new_listing(Some(vehicles[1].id), 31_000.0),
                new_listing(None, 12_000.0),
            ])
            .unwrap();

        let joined = store.joined_records().unwrap();
        assert_eq!(joined.len(), 1);
        let (vehicle, listing) = &joined[0];
        assert_eq!(vehicle, &vehicles[1]);
        assert_eq!(listing.listed_price, 31_000.0);
        assert_eq!(
            listing.listing_date,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_natural_keys_cover_every_vehicle() {
        let mut store = store();
        store
            .insert_vehicles(&[new_vehicle("Jeep", "Wrangler", 2021)])
            .unwrap();
        store
            .insert_vehicles(&[new_vehicle("Jeep", "Wrangler", 2021)])
            .unwrap();

        let keys = store.natural_keys().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].1, keys[1].1);
    }

    #[test]
    fn test_model_length_is_enforced_by_schema() {
        let mut store = store();
        let too_long = new_vehicle("Jeep", &"W".repeat(101), 2021);
        let err = store.insert_vehicles(&[too_long]).unwrap_err();
        assert!(err.is_store_failure());
    }

    #[test]
    fn test_unprovisioned_store_fails() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.insert_vehicles(&[new_vehicle("Kia", "Rio", 2014)]).is_err());
    }
}
