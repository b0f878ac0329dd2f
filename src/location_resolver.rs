//! Location Resolution Module
//!
//! This module resolves raw coordinates (a map tap, the device position) into
//! a bilingual city record through reverse geocoding. Unlike search, failures
//! here are returned to the caller, who acted on a specific point and needs a
//! definite outcome.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::bilingual::{FallbackNames, fill_fallback};
use crate::error::CoordinateMismatch;
use crate::identity::canonical_id;
use crate::models::{CityRecord, Coordinates, Locale, LocalizedText};
use crate::providers::{RawPlace, ReverseProvider};
use crate::{CityWeatherError, Result};

/// Largest `|Δlat| + |Δlon|` between requested and returned coordinates that
/// is still considered the same lookup
pub const MATCH_TOLERANCE: f64 = 0.1;

/// Outcome of a reverse lookup: the record, plus a soft warning when the
/// provider snapped to a point far from the request
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseResolution {
    pub record: CityRecord,
    pub mismatch: Option<CoordinateMismatch>,
}

/// Service for resolving coordinates into city records
pub struct ReverseResolver {
    reverse: Arc<dyn ReverseProvider>,
    timeout: Duration,
}

impl ReverseResolver {
    pub fn new(reverse: Arc<dyn ReverseProvider>) -> Self {
        Self {
            reverse,
            timeout: Duration::from_secs(8),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve coordinates into a city record named in `locale`, with the other
    /// locale filled when the provider has it.
    ///
    /// The record id and coordinates come from the provider's snapped location,
    /// not the request.
    ///
    /// A result counts as a city only when it has both a name and a country
    /// (name or code): missing either one is `CityNotFound`, since a record
    /// without a country cannot be labelled or matched by name.
    #[instrument(skip(self))]
    pub async fn resolve(&self, coords: Coordinates, locale: Locale) -> Result<ReverseResolution> {
        debug!("Resolving coordinates: ({})", coords);

        let place = fetch_first(self.reverse.as_ref(), coords, locale, self.timeout).await?;
        let country = place.country_name(locale);
        let name = match place.reverse_name() {
            Some(name) if !country.is_empty() => name,
            _ => {
                warn!("Reverse geocoding at ({}) returned no usable city", coords);
                return Err(CityWeatherError::city_not_found(coords));
            }
        };

        let returned = place.coords();
        let mismatch = check_match(coords, returned);
        if let Some(mismatch) = &mismatch {
            warn!("Reverse geocoding mismatch: {}", mismatch);
        }

        let record = CityRecord::new(
            canonical_id(&returned),
            returned,
            LocalizedText::single(locale, name),
            LocalizedText::single(locale, country),
        );

        let other = locale.other();
        let record = fill_fallback(record, other, |at| {
            lookup_names(self.reverse.as_ref(), at, other, self.timeout)
        })
        .await;

        info!("Resolved ({}) to {} [{}]", coords, record.label(locale), record.id);
        Ok(ReverseResolution { record, mismatch })
    }
}

/// City and country names at `coords` in `locale`, used to fill the second
/// language of a candidate or record
pub(crate) async fn lookup_names(
    reverse: &dyn ReverseProvider,
    coords: Coordinates,
    locale: Locale,
    timeout: Duration,
) -> Result<FallbackNames> {
    let place = fetch_first(reverse, coords, locale, timeout).await?;
    let name = place
        .reverse_name()
        .ok_or_else(|| CityWeatherError::city_not_found(coords))?;
    Ok(FallbackNames {
        name,
        country: place.country_name(locale),
    })
}

async fn fetch_first(
    reverse: &dyn ReverseProvider,
    coords: Coordinates,
    locale: Locale,
    timeout: Duration,
) -> Result<RawPlace> {
    let response = tokio::time::timeout(timeout, reverse.reverse(coords, locale))
        .await
        .map_err(|_| {
            CityWeatherError::provider(format!(
                "Reverse geocoding timed out after {:.1}s",
                timeout.as_secs_f64()
            ))
        })??;

    response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| CityWeatherError::city_not_found(coords))
}

fn check_match(requested: Coordinates, returned: Coordinates) -> Option<CoordinateMismatch> {
    let delta = requested.manhattan_delta(&returned);
    (delta > MATCH_TOLERANCE).then(|| CoordinateMismatch {
        requested,
        returned,
        delta,
        distance_km: requested.distance_km(&returned),
    })
}
