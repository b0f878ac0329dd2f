//! Open-Meteo current weather client (no API key required)

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{WeatherProvider, http_client};
use crate::config::WeatherConfig;
use crate::models::{Coordinates, Unit, WeatherPayload, weather_code_to_description};
use crate::{CityWeatherError, Result};

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,wind_direction_10m,weather_code,is_day";

/// Open-Meteo forecast API client
pub struct OpenMeteoClient {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Forecast response, only the `current` block is requested
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentData>,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    time: String,
    #[serde(rename = "temperature_2m")]
    temperature: f32,
    apparent_temperature: f32,
    #[serde(rename = "relative_humidity_2m")]
    humidity: u8,
    #[serde(rename = "wind_speed_10m")]
    wind_speed: f32,
    #[serde(rename = "wind_direction_10m")]
    wind_direction: u16,
    weather_code: u8,
    is_day: u8,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = http_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
        )?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn forecast_url(&self, coords: Coordinates, unit: Unit) -> String {
        let units = match unit {
            Unit::Metric => "temperature_unit=celsius&wind_speed_unit=kmh",
            Unit::Imperial => "temperature_unit=fahrenheit&wind_speed_unit=mph",
        };
        format!(
            "{}/forecast?latitude={}&longitude={}&current={}&{}&timezone=GMT",
            self.base_url, coords.lat, coords.lon, CURRENT_FIELDS, units
        )
    }
}

impl CurrentData {
    fn into_payload(self, unit: Unit) -> WeatherPayload {
        let observed_at = NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%dT%H:%M")
            .map_or_else(|_| Utc::now(), |dt| dt.and_utc());

        WeatherPayload {
            observed_at,
            temperature: self.temperature,
            apparent_temperature: self.apparent_temperature,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            weather_code: self.weather_code,
            is_day: self.is_day != 0,
            description: weather_code_to_description(self.weather_code).to_string(),
            unit,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self))]
    async fn current(&self, coords: Coordinates, unit: Unit) -> Result<WeatherPayload> {
        let url = self.forecast_url(coords, unit);
        debug!("Open-Meteo request URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CityWeatherError::provider(format!("Weather request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Open-Meteo returned status {}", status);
            return Err(CityWeatherError::provider(format!(
                "Weather API error {status}"
            )));
        }

        let forecast: ForecastResponse = response.json().await.map_err(|e| {
            CityWeatherError::provider(format!("Failed to parse Open-Meteo response: {e}"))
        })?;

        forecast
            .current
            .map(|current| current.into_payload(unit))
            .ok_or_else(|| {
                CityWeatherError::provider(format!("No current weather available at ({coords})"))
            })
    }
}
