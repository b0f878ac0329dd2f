//! Data models for city resolution
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates and the rounding that defines "the same place"
//! - City: locales, bilingual text, candidates and caller-owned records
//! - Weather: the payload a freshness refresh attaches to a record

pub mod city;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use city::{CityCandidate, CityRecord, Locale, LocalizedText, ResultType, Unit};
pub use location::{Coordinates, IDENTITY_PRECISION};
pub use weather::{WeatherPayload, weather_code_to_description};
