//! Linking each source row to the persisted vehicle it describes.

use crate::cleaner::MappedRecord;
use crate::types::{NaturalKey, NewListing, SourceKey, UNKNOWN_PLACEHOLDER, VehicleId};
use crate::utils::round_cents;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of looking up one source row in the vehicle catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(VehicleId),
    Unmatched,
    /// Number of vehicles sharing the key.
    Ambiguous(usize),
}

impl Resolution {
    pub fn vehicle_id(&self) -> Option<VehicleId> {
        match self {
            Self::Resolved(id) => Some(*id),
            Self::Unmatched | Self::Ambiguous(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub resolved: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
}

impl ResolutionReport {
    pub fn from_resolutions(resolutions: &[Resolution]) -> Self {
        let mut report = Self::default();
        for resolution in resolutions {
            match resolution {
                Resolution::Resolved(_) => report.resolved += 1,
                Resolution::Unmatched => report.unmatched += 1,
                Resolution::Ambiguous(_) => report.ambiguous += 1,
            }
        }
        report
    }

    pub fn unresolved(&self) -> usize {
        self.unmatched + self.ambiguous
    }
}

/// Exact-match lookup from natural key to vehicle id.
///
/// Keys are compared against the row as the source carried it, so a row
/// whose make was defaulted, whose model was truncated or whose year was
/// not numeric finds no vehicle.
pub struct ReferentialResolver {
    catalogue: HashMap<NaturalKey, Vec<VehicleId>>,
}

impl ReferentialResolver {
    pub fn new(natural_keys: Vec<(VehicleId, NaturalKey)>) -> Self {
        let mut catalogue: HashMap<NaturalKey, Vec<VehicleId>> = HashMap::new();
        for (id, key) in natural_keys {
            catalogue.entry(key).or_default().push(id);
        }
        debug!("Resolver catalogue holds {} distinct keys", catalogue.len());
        Self { catalogue }
    }

    pub fn resolve(&self, key: &SourceKey) -> Resolution {
        let Some(key) = key.to_natural_key() else {
            return Resolution::Unmatched;
        };
        match self.catalogue.get(&key).map(Vec::as_slice) {
            None | Some([]) => Resolution::Unmatched,
            Some([id]) => Resolution::Resolved(*id),
            Some(ids) => Resolution::Ambiguous(ids.len()),
        }
    }

    /// One listing per mapped record, in input order.
    pub fn build_listings(
        &self,
        records: &[MappedRecord],
        listing_date: NaiveDate,
    ) -> (Vec<NewListing>, Vec<Resolution>) {
        let resolutions: Vec<Resolution> = records
            .iter()
            .map(|record| self.resolve(&record.source_key))
            .collect();

        let listings = records
            .iter()
            .zip(&resolutions)
            .map(|(record, resolution)| NewListing {
                vehicle_id: resolution.vehicle_id(),
                location: UNKNOWN_PLACEHOLDER.to_string(),
                listing_date,
                listed_price: round_cents(record.listing.listed_price),
                mileage: record.listing.mileage,
            })
            .collect();

        let report = ResolutionReport::from_resolutions(&resolutions);
        if report.unresolved() > 0 {
            warn!(
                "{} listings have no vehicle reference ({} unmatched, {} ambiguous)",
                report.unresolved(),
                report.unmatched,
                report.ambiguous
            );
        }

        (listings, resolutions)
    }
}
