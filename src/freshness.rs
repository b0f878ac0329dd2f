//! Keeping each city's weather fresh
//!
//! A refresh only runs when the record is older than the staleness window
//! (or the caller forces it), and at most one refresh per city id is in
//! flight at a time. A failed refresh never loses data: the caller gets the
//! record back unchanged together with a retry request on the event channel.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use rand::RngExt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

use crate::models::{CityRecord, Locale, WeatherPayload};
use crate::providers::WeatherProvider;
use crate::{CityWeatherError, Result};

/// How old a record may get before a background refresh is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    pub max_age: TimeDelta,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self {
            max_age: TimeDelta::hours(3),
        }
    }
}

impl StalenessPolicy {
    /// Records that were never refreshed are always stale
    #[must_use]
    pub fn is_stale(&self, record: &CityRecord, now: DateTime<Utc>) -> bool {
        match record.last_updated {
            Some(updated) => now - updated > self.max_age,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshOptions {
    /// User-initiated: skip the staleness check and reject on failure
    pub force: bool,
    /// Language of the user-facing failure message
    pub locale: Locale,
}

impl RefreshOptions {
    #[must_use]
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}

/// Notifications sent to the caller alongside the returned record
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    Refreshed { id: String },
    /// Queue another attempt after `retry_in`
    RetryRequested { id: String, retry_in: Duration },
    /// A forced refresh failed; `message` is meant for the user
    Failed { id: String, message: String },
}

/// Staleness evaluation plus a per-city single-flight refresh guard
pub struct FreshnessCoordinator {
    weather: Arc<dyn WeatherProvider>,
    policy: StalenessPolicy,
    timeout: Duration,
    retry_delay: Duration,
    in_flight: Mutex<HashSet<String>>,
    events: Option<UnboundedSender<RefreshEvent>>,
}

/// Holds a city id in the in-flight set until dropped, so a cancelled
/// refresh cannot leave the id claimed
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.id);
    }
}

impl FreshnessCoordinator {
    pub fn new(weather: Arc<dyn WeatherProvider>) -> Self {
        Self {
            weather,
            policy: StalenessPolicy::default(),
            timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(60),
            in_flight: Mutex::new(HashSet::new()),
            events: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: UnboundedSender<RefreshEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    #[must_use]
    pub fn is_stale(&self, record: &CityRecord, now: DateTime<Utc>) -> bool {
        self.policy.is_stale(record, now)
    }

    /// Whether a refresh for `id` is currently running
    #[must_use]
    pub fn is_refreshing(&self, id: &str) -> bool {
        self.in_flight.lock().contains(id)
    }

    /// Refresh `record` when stale or forced.
    ///
    /// Returns the refreshed record on success, and an unchanged clone when
    /// the record is fresh, already being refreshed, or a background refresh
    /// failed. A failed forced refresh is the only `Err`; the caller keeps
    /// its original record either way.
    #[instrument(skip(self, record), fields(id = %record.id))]
    pub async fn refresh_if_needed(&self, record: &CityRecord, options: RefreshOptions) -> Result<CityRecord> {
        if !options.force && !self.is_stale(record, Utc::now()) {
            debug!("Weather for {} is fresh, skipping refresh", record.id);
            return Ok(record.clone());
        }

        let Some(_guard) = self.claim(&record.id) else {
            debug!("Refresh for {} already in flight", record.id);
            return Ok(record.clone());
        };

        match self.fetch(record).await {
            Ok(payload) => {
                let mut updated = record.clone();
                updated.weather = Some(payload);
                updated.last_updated = Some(Utc::now());
                info!("Refreshed weather for {}", record.label(Locale::En));
                self.emit(RefreshEvent::Refreshed {
                    id: record.id.clone(),
                });
                Ok(updated)
            }
            Err(e) => {
                warn!("Weather refresh for {} failed: {}", record.id, e);
                self.emit(RefreshEvent::RetryRequested {
                    id: record.id.clone(),
                    retry_in: self.jittered_retry_delay(),
                });
                if !options.force {
                    return Ok(record.clone());
                }
                self.emit(RefreshEvent::Failed {
                    id: record.id.clone(),
                    message: format!(
                        "Could not refresh the weather for {}. {}",
                        record.label(options.locale),
                        e.user_message()
                    ),
                });
                Err(e)
            }
        }
    }

    /// Background pass over a whole list. Each city is guarded on its own,
    /// results keep the input order.
    pub async fn refresh_stale(&self, records: &[CityRecord]) -> Vec<CityRecord> {
        let refreshes = records.iter().map(|record| async move {
            // background refreshes never reject
            self.refresh_if_needed(record, RefreshOptions::default())
                .await
                .unwrap_or_else(|_| record.clone())
        });
        join_all(refreshes).await
    }

    fn claim(&self, id: &str) -> Option<InFlightGuard<'_>> {
        let inserted = self.in_flight.lock().insert(id.to_string());
        inserted.then(|| InFlightGuard {
            in_flight: &self.in_flight,
            id: id.to_string(),
        })
    }

    async fn fetch(&self, record: &CityRecord) -> Result<WeatherPayload> {
        tokio::time::timeout(self.timeout, self.weather.current(record.coords, record.unit))
            .await
            .map_err(|_| {
                CityWeatherError::provider(format!(
                    "Weather request timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
    }

    fn jittered_retry_delay(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        self.retry_delay.mul_f64(jitter)
    }

    fn emit(&self, event: RefreshEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            debug!("Refresh event receiver dropped");
        }
    }
}
