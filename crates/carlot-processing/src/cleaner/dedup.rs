//! Exact-duplicate removal for vehicles before they are persisted.

use crate::types::NewVehicle;
use std::collections::HashSet;
use tracing::debug;

/// Drop vehicles equal on every field. First occurrence wins and the
/// surviving vehicles keep their original relative order.
pub fn dedup_vehicles<'a, I>(vehicles: I) -> Vec<NewVehicle>
where
    I: IntoIterator<Item = &'a NewVehicle>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    let mut total = 0usize;

    for vehicle in vehicles {
        total += 1;
        if seen.insert(vehicle) {
            unique.push(vehicle.clone());
        }
    }

    debug!(
        "Removed {} duplicate vehicle rows ({} unique)",
        total - unique.len(),
        unique.len()
    );
    unique
}
