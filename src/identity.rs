//! Canonical city ids and tolerant equivalence between city records.
//!
//! Providers disagree on whether two textually identical cities share a
//! coordinate-derived id, so equivalence accepts any of three matches: same
//! id, same rounded coordinates, or same English city and country name.

use crate::models::{CityRecord, Coordinates, IDENTITY_PRECISION};

/// Deterministic id keyed on coordinates rounded to 2 decimals
#[must_use]
pub fn canonical_id(coords: &Coordinates) -> String {
    let (lat, lon) = coords.rounded(IDENTITY_PRECISION);
    format!("city:{lat:.2}_{lon:.2}")
}

/// Whether two records describe the same city
#[must_use]
pub fn are_equivalent(a: &CityRecord, b: &CityRecord) -> bool {
    a.id == b.id || a.coords.same_place(&b.coords) || same_english_name(a, b)
}

// Empty never equals empty: two unresolved records are not the same city.
fn same_english_name(a: &CityRecord, b: &CityRecord) -> bool {
    let (city_a, city_b) = (a.city.en.trim(), b.city.en.trim());
    if city_a.is_empty() || city_b.is_empty() {
        return false;
    }
    city_a.to_lowercase() == city_b.to_lowercase()
        && a.country.en.trim().to_lowercase() == b.country.en.trim().to_lowercase()
}
