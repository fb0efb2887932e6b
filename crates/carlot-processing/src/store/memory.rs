use super::EntityStore;
use crate::error::Result;
use crate::types::{Listing, ListingId, NaturalKey, NewListing, NewVehicle, Vehicle, VehicleId};
use std::collections::HashMap;

/// Store backed by in-process vectors. Ids start at 1, like an
/// auto-increment column.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    vehicles: Vec<Vehicle>,
    listings: Vec<Listing>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }
}

impl EntityStore for MemoryStore {
    fn insert_vehicles(&mut self, vehicles: &[NewVehicle]) -> Result<Vec<Vehicle>> {
        let first_id = self.vehicles.len() as i64 + 1;
        let inserted: Vec<Vehicle> = vehicles
            .iter()
            .cloned()
            .zip(first_id..)
            .map(|(vehicle, id)| vehicle.into_vehicle(VehicleId(id)))
            .collect();
        self.vehicles.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    fn natural_keys(&self) -> Result<Vec<(VehicleId, NaturalKey)>> {
        Ok(self
            .vehicles
            .iter()
            .map(|v| (v.id, v.natural_key()))
            .collect())
    }

    fn insert_listings(&mut self, listings: &[NewListing]) -> Result<Vec<Listing>> {
        let first_id = self.listings.len() as i64 + 1;
        let inserted: Vec<Listing> = listings
            .iter()
            .cloned()
            .zip(first_id..)
            .map(|(listing, id)| listing.into_listing(ListingId(id)))
            .collect();
        self.listings.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    fn joined_records(&self) -> Result<Vec<(Vehicle, Listing)>> {
        let by_id: HashMap<VehicleId, &Vehicle> =
            self.vehicles.iter().map(|v| (v.id, v)).collect();
        Ok(self
            .listings
            .iter()
            .filter_map(|listing| {
                let vehicle = by_id.get(&listing.vehicle_id?)?;
                Some(((*vehicle).clone(), listing.clone()))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
