//! In-memory providers for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{PlaceResults, RawPlace, ReverseProvider, SearchProvider, WeatherProvider};
use crate::identity::canonical_id;
use crate::models::{Coordinates, Locale, Unit, WeatherPayload};
use crate::{CityWeatherError, Result};

pub(crate) fn place(lat: f64, lon: f64, city: &str, code: &str, result_type: &str) -> RawPlace {
    RawPlace {
        lat,
        lon,
        city: Some(city.to_string()),
        country_code: Some(code.to_string()),
        result_type: Some(result_type.to_string()),
        ..RawPlace::default()
    }
}

/// Geocoder keyed by lowercased query (search) and canonical id (reverse)
#[derive(Default)]
pub(crate) struct FakeGeocoder {
    search: Mutex<HashMap<(String, Locale), Vec<RawPlace>>>,
    reverse: Mutex<HashMap<(String, Locale), Vec<RawPlace>>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<Option<CityWeatherError>>,
    pub search_calls: AtomicUsize,
    pub reverse_calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn with_search(self, query: &str, locale: Locale, places: Vec<RawPlace>) -> Self {
        self.search.lock().insert((query.to_lowercase(), locale), places);
        self
    }

    pub fn with_reverse(self, coords: Coordinates, locale: Locale, places: Vec<RawPlace>) -> Self {
        self.reverse.lock().insert((canonical_id(&coords), locale), places);
        self
    }

    pub fn with_delay(self, query: &str, delay: Duration) -> Self {
        self.delays.lock().insert(query.to_lowercase(), delay);
        self
    }

    pub fn failing_with(self, err: CityWeatherError) -> Self {
        *self.failing.lock() = Some(err);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Option<CityWeatherError> {
        self.failing.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeGeocoder {
    async fn search(&self, query: &str, locale: Locale) -> Result<PlaceResults> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().get(&query.to_lowercase()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let results = self
            .search
            .lock()
            .get(&(query.to_lowercase(), locale))
            .cloned()
            .unwrap_or_default();
        Ok(PlaceResults { results })
    }
}

#[async_trait]
impl ReverseProvider for FakeGeocoder {
    async fn reverse(&self, coords: Coordinates, locale: Locale) -> Result<PlaceResults> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let results = self
            .reverse
            .lock()
            .get(&(canonical_id(&coords), locale))
            .cloned()
            .unwrap_or_default();
        Ok(PlaceResults { results })
    }
}

/// Weather source with a configurable latency and failure switch
#[derive(Default)]
pub(crate) struct FakeWeather {
    pub delay: Duration,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeWeather {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current(&self, _coords: Coordinates, unit: Unit) -> Result<WeatherPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(CityWeatherError::provider("weather service unavailable"));
        }
        Ok(WeatherPayload {
            observed_at: Utc::now(),
            temperature: 24.0,
            apparent_temperature: 25.0,
            humidity: 55,
            wind_speed: 10.0,
            wind_direction: 300,
            weather_code: 0,
            is_day: true,
            description: "Clear sky".to_string(),
            unit,
        })
    }
}
