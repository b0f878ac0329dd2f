//! Configuration management for the city resolution core
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::CityWeatherError;
use crate::freshness::StalenessPolicy;
use crate::suggestions::SearchSettings;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CityWeatherConfig {
    /// Geocoding (search and reverse) provider
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Current weather provider
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Incremental search tuning
    #[serde(default)]
    pub search: SearchConfig,
    /// Weather refresh policy
    #[serde(default)]
    pub freshness: FreshnessConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Geocoding API configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Geoapify API key, required for every geocoding call
    pub api_key: Option<String>,
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Weather API configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Delay after the last keystroke before a search starts
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
    /// Ranked results kept before de-duplication
    #[serde(default = "default_rank_window")]
    pub rank_window: usize,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessConfig {
    /// Age after which a background refresh is due
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u32,
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_seconds: u32,
    /// Base delay of a retry requested after a failed refresh
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_geocoding_base_url() -> String {
    "https://api.geoapify.com/v1".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_timeout() -> u32 {
    8
}

fn default_max_retries() -> u32 {
    2
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_min_query_chars() -> usize {
    2
}

fn default_rank_window() -> usize {
    8
}

fn default_max_suggestions() -> usize {
    6
}

fn default_max_age_minutes() -> u32 {
    180
}

fn default_refresh_timeout() -> u32 {
    10
}

fn default_retry_delay() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_geocoding_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_chars: default_min_query_chars(),
            rank_window: default_rank_window(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: default_max_age_minutes(),
            refresh_timeout_seconds: default_refresh_timeout(),
            retry_delay_seconds: default_retry_delay(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CityWeatherConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CITYWEATHER_GEOCODING__API_KEY and friends
        builder = builder.add_source(
            Environment::with_prefix("CITYWEATHER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| format!("Failed to build configuration from {}", config_file.display()))?;

        let mut config: CityWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cityweather").join("config.toml"))
    }

    /// Replace zero and empty values with their defaults
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.search.debounce_ms == 0 {
            self.search.debounce_ms = default_debounce_ms();
        }
        if self.search.min_query_chars == 0 {
            self.search.min_query_chars = default_min_query_chars();
        }
        if self.search.rank_window == 0 {
            self.search.rank_window = default_rank_window();
        }
        if self.search.max_suggestions == 0 {
            self.search.max_suggestions = default_max_suggestions();
        }
        if self.freshness.max_age_minutes == 0 {
            self.freshness.max_age_minutes = default_max_age_minutes();
        }
        if self.freshness.refresh_timeout_seconds == 0 {
            self.freshness.refresh_timeout_seconds = default_refresh_timeout();
        }
        if self.freshness.retry_delay_seconds == 0 {
            self.freshness.retry_delay_seconds = default_retry_delay();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// The key is optional at load time (the geocoder reports a missing key
    /// per call), but a present key must not be blank
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.geocoding.api_key
            && api_key.trim().is_empty()
        {
            return Err(CityWeatherError::config(
                "Geocoding API key cannot be empty if provided. Either remove it or provide a valid key.",
            )
            .into());
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
        ] {
            if timeout > 300 {
                return Err(CityWeatherError::config(format!(
                    "{name} API timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        for (name, retries) in [
            ("Geocoding", self.geocoding.max_retries),
            ("Weather", self.weather.max_retries),
        ] {
            if retries > 10 {
                return Err(
                    CityWeatherError::config(format!("{name} API max retries cannot exceed 10")).into(),
                );
            }
        }

        if self.search.debounce_ms > 5000 {
            return Err(CityWeatherError::config("Search debounce cannot exceed 5000 ms").into());
        }

        if !(1..=10).contains(&self.search.min_query_chars) {
            return Err(CityWeatherError::config(
                "Minimum query length must be between 1 and 10 characters",
            )
            .into());
        }

        if self.search.max_suggestions > self.search.rank_window || self.search.rank_window > 50 {
            return Err(CityWeatherError::config(
                "Search limits must satisfy 1 <= max_suggestions <= rank_window <= 50",
            )
            .into());
        }

        if self.freshness.max_age_minutes > 7 * 24 * 60 {
            return Err(CityWeatherError::config(
                "Weather max age cannot exceed 10080 minutes (1 week)",
            )
            .into());
        }

        if self.freshness.refresh_timeout_seconds > 300 {
            return Err(
                CityWeatherError::config("Refresh timeout cannot exceed 300 seconds").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CityWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CityWeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Geocoding", &self.geocoding.base_url),
            ("Weather", &self.weather.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CityWeatherError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

impl SearchConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Pipeline limits; fallback lookups share the geocoder timeout
    #[must_use]
    pub fn settings(&self, geocoding: &GeocodingConfig) -> SearchSettings {
        SearchSettings {
            min_query_chars: self.min_query_chars,
            rank_window: self.rank_window,
            max_results: self.max_suggestions,
            lookup_timeout: Duration::from_secs(geocoding.timeout_seconds.into()),
        }
    }
}

impl FreshnessConfig {
    #[must_use]
    pub fn policy(&self) -> StalenessPolicy {
        StalenessPolicy {
            max_age: TimeDelta::minutes(self.max_age_minutes.into()),
        }
    }

    #[must_use]
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_seconds.into())
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds.into())
    }
}
