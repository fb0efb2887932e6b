//! Categorical canonicalization for fuel type and transmission.
//!
//! Lookups are exact and case-sensitive. Anything missing from a table,
//! including the placeholder substituted for an absent value, maps to the
//! `Unknown` member.

use crate::types::{FuelType, Transmission, UNKNOWN_PLACEHOLDER};

/// Source spellings of fuel types.
pub const FUEL_TYPE_TABLE: &[(&str, FuelType)] = &[
    ("E85 Flex Fuel", FuelType::FlexFuel),
    ("Gasoline", FuelType::Gasoline),
    ("Hybrid", FuelType::Hybrid),
    ("Diesel", FuelType::Diesel),
    ("Electric", FuelType::Electric),
];

/// Source spellings of transmissions.
pub const TRANSMISSION_TABLE: &[(&str, Transmission)] = &[
    ("6-Speed A/T", Transmission::SixSpeedAt),
    ("8-Speed Automatic", Transmission::EightSpeedAutomatic),
    ("7-Speed A/T", Transmission::SevenSpeedAt),
    ("Automatic", Transmission::Automatic),
    ("A/T", Transmission::Automatic),
    ("Manual", Transmission::Manual),
    ("F", Transmission::Unknown),
];

/// Maps free text onto the closed fuel/transmission enumerations.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer {
    fuel_types: &'static [(&'static str, FuelType)],
    transmissions: &'static [(&'static str, Transmission)],
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(FUEL_TYPE_TABLE, TRANSMISSION_TABLE)
    }
}

impl Canonicalizer {
    pub fn new(
        fuel_types: &'static [(&'static str, FuelType)],
        transmissions: &'static [(&'static str, Transmission)],
    ) -> Self {
        Self {
            fuel_types,
            transmissions,
        }
    }

    pub fn fuel_type(&self, raw: Option<&str>) -> FuelType {
        lookup(self.fuel_types, raw).unwrap_or(FuelType::Unknown)
    }

    pub fn transmission(&self, raw: Option<&str>) -> Transmission {
        lookup(self.transmissions, raw).unwrap_or(Transmission::Unknown)
    }
}

fn lookup<T: Copy>(table: &[(&str, T)], raw: Option<&str>) -> Option<T> {
    let key = raw.unwrap_or(UNKNOWN_PLACEHOLDER);
    table
        .iter()
        .find(|(spelling, _)| *spelling == key)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_type_table_hits() {
        let canon = Canonicalizer::default();
        assert_eq!(canon.fuel_type(Some("E85 Flex Fuel")), FuelType::FlexFuel);
        assert_eq!(canon.fuel_type(Some("Gasoline")), FuelType::Gasoline);
        assert_eq!(canon.fuel_type(Some("Hybrid")), FuelType::Hybrid);
        assert_eq!(canon.fuel_type(Some("Diesel")), FuelType::Diesel);
        assert_eq!(canon.fuel_type(Some("Electric")), FuelType::Electric);
    }

    #[test]
    fn test_transmission_table_hits() {
        let canon = Canonicalizer::default();
        assert_eq!(
            canon.transmission(Some("6-Speed A/T")),
            Transmission::SixSpeedAt
        );
        assert_eq!(
            canon.transmission(Some("8-Speed Automatic")),
            Transmission::EightSpeedAutomatic
        );
        assert_eq!(
            canon.transmission(Some("7-Speed A/T")),
            Transmission::SevenSpeedAt
        );
        assert_eq!(
            canon.transmission(Some("Automatic")),
            Transmission::Automatic
        );
        assert_eq!(canon.transmission(Some("A/T")), Transmission::Automatic);
        assert_eq!(canon.transmission(Some("Manual")), Transmission::Manual);
        assert_eq!(canon.transmission(Some("F")), Transmission::Unknown);
    }

    #[test]
    fn test_misses_map_to_unknown() {
        let canon = Canonicalizer::default();
        for raw in ["Sedan", "gasoline", "GASOLINE", " Gasoline", "", "–", "Plug-In Hybrid"] {
            assert_eq!(canon.fuel_type(Some(raw)), FuelType::Unknown, "{raw:?}");
        }
        for raw in ["Sedan", "automatic", "6-speed a/t", "10-Speed A/T", ""] {
            assert_eq!(
                canon.transmission(Some(raw)),
                Transmission::Unknown,
                "{raw:?}"
            );
        }
    }

    #[test]
    fn test_absent_values_map_to_unknown() {
        let canon = Canonicalizer::default();
        assert_eq!(canon.fuel_type(None), FuelType::Unknown);
        assert_eq!(canon.transmission(None), Transmission::Unknown);
    }

    #[test]
    fn test_injected_tables() {
        const FUEL: &[(&str, FuelType)] = &[("Unknown", FuelType::Gasoline)];
        const TRANS: &[(&str, Transmission)] = &[("CVT", Transmission::Automatic)];
        let canon = Canonicalizer::new(FUEL, TRANS);

        // the placeholder is looked up like any other spelling
        assert_eq!(canon.fuel_type(None), FuelType::Gasoline);
        assert_eq!(canon.transmission(Some("CVT")), Transmission::Automatic);
        assert_eq!(canon.transmission(Some("Manual")), Transmission::Unknown);
    }
}
