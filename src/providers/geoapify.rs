//! Geoapify geocoding client (autocomplete search and reverse lookup)

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use super::{PlaceResults, ReverseProvider, SearchProvider, http_client};
use crate::config::GeocodingConfig;
use crate::models::{Coordinates, Locale};
use crate::{CityWeatherError, Result};

/// Raw suggestions requested per query; filtering and ranking trim these down
const SEARCH_LIMIT: u32 = 20;

/// Geoapify API client
pub struct GeoapifyClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
}

impl GeoapifyClient {
    /// Create a new client. A missing API key is only reported when a request
    /// is attempted, as a configuration error.
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = http_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
        )?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                error!("Geoapify API key is not configured");
                CityWeatherError::config(
                    "Missing geocoding API key (set geocoding.api_key or CITYWEATHER_GEOCODING__API_KEY)",
                )
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CityWeatherError::provider(format!("Geocoding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return match status.as_u16() {
                401 | 403 => {
                    error!("Geoapify rejected the API key (HTTP {})", status.as_u16());
                    Err(CityWeatherError::config(format!(
                        "Geocoding API key rejected: {status}"
                    )))
                }
                _ => {
                    warn!("Geoapify error {}: {}", status, error_text);
                    Err(CityWeatherError::provider(format!(
                        "Geocoding API error {status}: {error_text}"
                    )))
                }
            };
        }

        response.json::<T>().await.map_err(|e| {
            CityWeatherError::provider(format!("Failed to parse geocoding response: {e}"))
        })
    }
}

#[async_trait]
impl SearchProvider for GeoapifyClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, locale: Locale) -> Result<PlaceResults> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/geocode/autocomplete?text={}&lang={}&limit={}&format=json&apiKey={}",
            self.base_url,
            urlencoding::encode(query),
            locale.as_str(),
            SEARCH_LIMIT,
            urlencoding::encode(api_key)
        );

        let results: PlaceResults = self.get_json(&url).await?;
        debug!("Geoapify returned {} suggestions for '{}'", results.results.len(), query);
        Ok(results)
    }
}

#[async_trait]
impl ReverseProvider for GeoapifyClient {
    #[instrument(skip(self))]
    async fn reverse(&self, coords: Coordinates, locale: Locale) -> Result<PlaceResults> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/geocode/reverse?lat={}&lon={}&lang={}&format=json&apiKey={}",
            self.base_url,
            coords.lat,
            coords.lon,
            locale.as_str(),
            urlencoding::encode(api_key)
        );

        let results: PlaceResults = self.get_json(&url).await?;
        debug!("Geoapify reverse returned {} places at ({})", results.results.len(), coords);
        Ok(results)
    }
}
