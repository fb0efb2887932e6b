//! Entity store for persisted vehicles and listings.
//!
//! This module defines the [`EntityStore`] trait that both runs talk to.
//! Ingestion writes vehicles, reads back their natural keys and writes
//! listings; the ETL run reads the joined view.
//!
//! Two implementations are provided:
//!
//! - [`SqliteStore`] - a SQLite database file (the CLI default)
//! - [`MemoryStore`] - in-process vectors, for tests and dry runs
//!
//! # Example
//!
//! ```rust,ignore
//! use carlot_processing::store::{EntityStore, SqliteStore};
//!
//! let mut store = SqliteStore::open("data/used_cars.db")?;
//! store.provision()?;
//! let vehicles = store.insert_vehicles(&drafts)?;
//! ```

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::{Listing, NaturalKey, NewListing, NewVehicle, Vehicle, VehicleId};

/// Storage backend for the `cars` and `listings` entities.
///
/// Identifiers are assigned by the store on insert and never reused.
/// Inserted entities are never updated or deleted by the pipeline.
pub trait EntityStore {
    /// Persist vehicles in order, returning them with their new ids.
    fn insert_vehicles(&mut self, vehicles: &[NewVehicle]) -> Result<Vec<Vehicle>>;

    /// `(id, make, model, year)` of every vehicle in the store, including
    /// vehicles written by earlier runs.
    fn natural_keys(&self) -> Result<Vec<(VehicleId, NaturalKey)>>;

    /// Persist listings in order, returning them with their new ids.
    fn insert_listings(&mut self, listings: &[NewListing]) -> Result<Vec<Listing>>;

    /// Inner join of listings to vehicles on the vehicle reference,
    /// ordered by listing id. Listings without a vehicle are not returned.
    fn joined_records(&self) -> Result<Vec<(Vehicle, Listing)>>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
