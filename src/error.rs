//! Error types and handling for the city resolution core

use std::fmt;

use thiserror::Error;

use crate::models::Coordinates;

/// Main error type for city resolution and weather refresh
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CityWeatherError {
    /// Missing or rejected provider credentials. Fatal, never retried.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// HTTP, network, timeout or malformed payload from an upstream provider
    #[error("Provider error: {message}")]
    Provider { message: String },

    /// Reverse geocoding produced nothing usable at these coordinates
    #[error("No city found at ({lat:.4}, {lon:.4})")]
    CityNotFound { lat: f64, lon: f64 },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl CityWeatherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn city_not_found(coords: Coordinates) -> Self {
        Self::CityNotFound {
            lat: coords.lat,
            lon: coords.lon,
        }
    }

    /// Configuration errors abort every path, including the search path that
    /// otherwise degrades to empty results.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CityWeatherError::Config { .. } => {
                "Configuration error. Please check your geocoding API key.".to_string()
            }
            CityWeatherError::Provider { .. } => {
                "Unable to reach the weather services. Please check your internet connection."
                    .to_string()
            }
            CityWeatherError::CityNotFound { .. } => {
                "Could not find a city at this location.".to_string()
            }
            CityWeatherError::Validation { message } => format!("Invalid input: {message}"),
        }
    }
}

/// Soft warning raised when the provider snapped a reverse lookup far away from
/// the requested point. The resolved record is still returned alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMismatch {
    pub requested: Coordinates,
    pub returned: Coordinates,
    /// `|Δlat| + |Δlon|` in degrees
    pub delta: f64,
    /// Great-circle distance between the two points
    pub distance_km: f64,
}

impl fmt::Display for CoordinateMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "provider returned {} for requested {} ({:.1} km away)",
            self.returned, self.requested, self.distance_km
        )
    }
}
