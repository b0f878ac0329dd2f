//! Upstream provider contracts
//!
//! The resolution core only sees providers through these traits: a geocoder
//! for free-text search, a reverse geocoder, and a current-weather source.
//! `geoapify` and `open_meteo` hold the HTTP implementations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;

use crate::countries::resolve_country;
use crate::models::{Coordinates, Locale, ResultType, Unit, WeatherPayload};
use crate::{CityWeatherError, Result};

#[cfg(test)]
pub(crate) mod fakes;
pub mod geoapify;
pub mod open_meteo;

pub use geoapify::GeoapifyClient;
pub use open_meteo::OpenMeteoClient;

const USER_AGENT: &str = "CityWeather/0.1.0";

/// One place as the geocoder reports it
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawPlace {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub result_type: Option<String>,
}

/// Geocoder response envelope
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PlaceResults {
    #[serde(default)]
    pub results: Vec<RawPlace>,
}

impl RawPlace {
    #[must_use]
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// Allow-listed place type, `None` for streets, amenities and unknowns
    #[must_use]
    pub fn place_type(&self) -> Option<ResultType> {
        self.result_type.as_deref().and_then(ResultType::parse)
    }

    /// Name used for search suggestions: `city`, else the address line
    #[must_use]
    pub fn suggestion_name(&self) -> Option<String> {
        non_empty(self.city.as_deref()).or_else(|| first_segment(self.address_line1.as_deref()))
    }

    /// Name used for reverse lookups: formatted address first segment, then
    /// address line, then `city`
    #[must_use]
    pub fn reverse_name(&self) -> Option<String> {
        first_segment(self.formatted.as_deref())
            .or_else(|| first_segment(self.address_line1.as_deref()))
            .or_else(|| non_empty(self.city.as_deref()))
    }

    /// Full country display name in `locale`, empty if the provider sent none
    #[must_use]
    pub fn country_name(&self, locale: Locale) -> String {
        resolve_country(self.country.as_deref(), self.country_code.as_deref(), locale)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn first_segment(value: Option<&str>) -> Option<String> {
    non_empty(value.and_then(|v| v.split(',').next()))
}

/// Free-text geocoding
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, locale: Locale) -> Result<PlaceResults>;
}

/// Coordinates to places, best match first
#[async_trait]
pub trait ReverseProvider: Send + Sync {
    async fn reverse(&self, coords: Coordinates, locale: Locale) -> Result<PlaceResults>;
}

/// Current conditions for a point
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, coords: Coordinates, unit: Unit) -> Result<WeatherPayload>;
}

/// HTTP client with a hard per-call timeout and exponential retry on
/// transient failures
pub(crate) fn http_client(timeout: Duration, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| CityWeatherError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(json: serde_json::Value) -> RawPlace {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_deserialize_sparse_place() {
        let results: PlaceResults = serde_json::from_str(
            r#"{"results":[{"lat":32.0853,"lon":34.7818,"city":"Tel Aviv","country_code":"il","result_type":"city","rank":{"confidence":1}}]}"#,
        )
        .unwrap();
        let first = &results.results[0];
        assert_eq!(first.coords(), Coordinates::new(32.0853, 34.7818));
        assert_eq!(first.place_type(), Some(ResultType::City));
        assert!(first.formatted.is_none());
    }

    #[test]
    fn test_missing_results_is_empty() {
        let results: PlaceResults = serde_json::from_str("{}").unwrap();
        assert!(results.results.is_empty());
    }

    #[test]
    fn test_suggestion_name_prefers_city() {
        let p = place(serde_json::json!({
            "lat": 0.0, "lon": 0.0,
            "city": "Haifa", "address_line1": "Haifa District, Israel"
        }));
        assert_eq!(p.suggestion_name().as_deref(), Some("Haifa"));

        let p = place(serde_json::json!({"lat": 0.0, "lon": 0.0, "address_line1": "Eilat, Israel"}));
        assert_eq!(p.suggestion_name().as_deref(), Some("Eilat"));
    }

    #[test]
    fn test_reverse_name_priority() {
        let p = place(serde_json::json!({
            "lat": 0.0, "lon": 0.0,
            "city": "Tel Aviv-Yafo",
            "address_line1": "Jaffa",
            "formatted": "Tel Aviv, Tel Aviv District, Israel"
        }));
        assert_eq!(p.reverse_name().as_deref(), Some("Tel Aviv"));

        let p = place(serde_json::json!({
            "lat": 0.0, "lon": 0.0, "city": "Tel Aviv-Yafo", "formatted": " , "
        }));
        assert_eq!(p.reverse_name().as_deref(), Some("Tel Aviv-Yafo"));

        assert_eq!(RawPlace::default().reverse_name(), None);
    }

    #[test]
    fn test_country_name_from_code() {
        let p = place(serde_json::json!({"lat": 0.0, "lon": 0.0, "country": "", "country_code": "IL"}));
        assert_eq!(p.country_name(Locale::En), "Israel");
        assert_eq!(p.country_name(Locale::He), "ישראל");
    }
}
