//! `CityWeather` - city resolution and weather freshness for a city list
//!
//! This library turns free-text queries and raw coordinates into canonical,
//! de-duplicated, bilingual city records, and keeps each city's weather fresh
//! without duplicate concurrent refreshes or stale overwrites.

pub mod bilingual;
pub mod config;
pub mod countries;
pub mod error;
pub mod freshness;
pub mod identity;
pub mod location_resolver;
pub mod models;
pub mod providers;
pub mod search;
pub mod suggestions;
pub mod telemetry;

// Re-export core types for public API
pub use bilingual::{FallbackNames, fill_fallback, merge_into};
pub use config::CityWeatherConfig;
pub use error::{CityWeatherError, CoordinateMismatch};
pub use freshness::{FreshnessCoordinator, RefreshEvent, RefreshOptions, StalenessPolicy};
pub use identity::{are_equivalent, canonical_id};
pub use location_resolver::{ReverseResolution, ReverseResolver};
pub use models::{CityCandidate, CityRecord, Coordinates, Locale, LocalizedText, Unit, WeatherPayload};
pub use providers::{GeoapifyClient, OpenMeteoClient, ReverseProvider, SearchProvider, WeatherProvider};
pub use search::{SearchPhase, SearchSession, SearchSnapshot, SuggestionSearch};
pub use suggestions::{GeocodeQueryResolver, SearchSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CityWeatherError>;
