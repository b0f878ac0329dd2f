//! Coordinate model and 2-decimal rounding used for identity

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CityWeatherError, Result};

/// Number of decimals kept when two points are compared as "the same place"
/// (about 1.1 km at the equator).
pub const IDENTITY_PRECISION: u32 = 2;

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create coordinates, rejecting values outside [-90, 90] x [-180, 180]
    pub fn checked(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CityWeatherError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CityWeatherError::validation(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Round coordinates to `precision` decimals, half away from zero
    #[must_use]
    pub fn rounded(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        // `+ 0.0` folds -0.0 into 0.0 so both format the same way
        let lat = (self.lat * multiplier).round() / multiplier + 0.0;
        let lon = (self.lon * multiplier).round() / multiplier + 0.0;
        (lat, lon)
    }

    /// Whether both points fall into the same 2-decimal bucket
    #[must_use]
    pub fn same_place(&self, other: &Coordinates) -> bool {
        self.rounded(IDENTITY_PRECISION) == other.rounded(IDENTITY_PRECISION)
    }

    /// Sum of absolute latitude and longitude differences, in degrees
    #[must_use]
    pub fn manhattan_delta(&self, other: &Coordinates) -> f64 {
        (self.lat - other.lat).abs() + (self.lon - other.lon).abs()
    }

    /// Great-circle distance in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.lat,
                longitude: self.lon,
            },
            haversine::Location {
                latitude: other.lat,
                longitude: other.lon,
            },
            haversine::Units::Kilometers,
        )
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_coordinates() {
        let coords = Coordinates::new(46.818_234, 8.227_456);
        assert_eq!(coords.rounded(2), (46.82, 8.23));
    }

    #[test]
    fn test_rounding_folds_negative_zero() {
        let coords = Coordinates::new(-0.001, -0.004);
        let (lat, lon) = coords.rounded(2);
        assert_eq!(format!("{lat:.2}_{lon:.2}"), "0.00_0.00");
    }

    #[test]
    fn test_same_place_tolerance() {
        let a = Coordinates::new(40.71284, -74.00601);
        let b = Coordinates::new(40.7129, -74.006);
        assert!(a.same_place(&b));
        assert!(!a.same_place(&Coordinates::new(40.73, -74.006)));
    }

    #[test]
    fn test_checked_rejects_out_of_range() {
        assert!(Coordinates::checked(91.0, 0.0).is_err());
        assert!(Coordinates::checked(0.0, -181.0).is_err());
        assert!(Coordinates::checked(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_manhattan_delta_and_distance() {
        let a = Coordinates::new(32.0, 34.0);
        let b = Coordinates::new(32.05, 34.03);
        assert!((a.manhattan_delta(&b) - 0.08).abs() < 1e-9);
        let km = a.distance_km(&b);
        assert!(km > 5.0 && km < 7.0, "unexpected distance {km}");
    }

    #[test]
    fn test_display() {
        assert_eq!(Coordinates::new(46.8182, 8.2275).to_string(), "46.8182, 8.2275");
    }
}
