//! Free-text city suggestions
//!
//! Turns a partial query into a short, ranked, de-duplicated list of city
//! candidates, each filled in the second language where the geocoder allows.
//! Provider failures degrade to an empty list; only a missing credential is
//! reported as an error.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::bilingual::fill_fallback;
use crate::identity::canonical_id;
use crate::location_resolver::lookup_names;
use crate::models::{CityCandidate, Locale, LocalizedText};
use crate::providers::{RawPlace, ReverseProvider, SearchProvider};
use crate::Result;

/// Limits applied by the suggestion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Shorter queries never reach the provider
    pub min_query_chars: usize,
    /// Ranked results kept before de-duplication
    pub rank_window: usize,
    /// Final number of suggestions
    pub max_results: usize,
    /// Timeout of each fallback-language lookup
    pub lookup_timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_query_chars: 2,
            rank_window: 8,
            max_results: 6,
            lookup_timeout: Duration::from_secs(8),
        }
    }
}

impl SearchSettings {
    #[must_use]
    pub fn accepts(&self, query: &str) -> bool {
        query.trim().chars().count() >= self.min_query_chars
    }
}

/// Service resolving search queries into city candidates
pub struct GeocodeQueryResolver {
    search: Arc<dyn SearchProvider>,
    reverse: Arc<dyn ReverseProvider>,
    settings: SearchSettings,
}

impl GeocodeQueryResolver {
    pub fn new(search: Arc<dyn SearchProvider>, reverse: Arc<dyn ReverseProvider>) -> Self {
        Self {
            search,
            reverse,
            settings: SearchSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Ranked, unique-by-id candidates for `query`.
    ///
    /// When `locale` yields nothing the whole pipeline runs once more with the
    /// other locale as primary.
    #[instrument(skip(self))]
    pub async fn resolve_suggestions(&self, query: &str, locale: Locale) -> Result<Vec<CityCandidate>> {
        let query = query.trim();
        if !self.settings.accepts(query) {
            debug!("Query below minimum length, skipping provider");
            return Ok(Vec::new());
        }

        let candidates = self.run_pipeline(query, locale).await?;
        if !candidates.is_empty() {
            info!("Resolved {} suggestions for '{}' ({})", candidates.len(), query, locale);
            return Ok(candidates);
        }

        debug!("No {} results for '{}', retrying in {}", locale, query, locale.other());
        let candidates = self.run_pipeline(query, locale.other()).await?;
        info!(
            "Resolved {} suggestions for '{}' via {} fallback",
            candidates.len(),
            query,
            locale.other()
        );
        Ok(candidates)
    }

    async fn run_pipeline(&self, query: &str, locale: Locale) -> Result<Vec<CityCandidate>> {
        let places = match self.search.search(query, locale).await {
            Ok(response) => response.results,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Search for '{}' failed, showing no results: {}", query, e);
                return Ok(Vec::new());
            }
        };

        let mut candidates = rank_places(query, places, locale, self.settings.rank_window);
        candidates.truncate(self.settings.max_results);

        let fallback = locale.other();
        let filled = join_all(candidates.into_iter().map(|candidate| {
            fill_fallback(candidate, fallback, |coords| {
                lookup_names(self.reverse.as_ref(), coords, fallback, self.settings.lookup_timeout)
            })
        }))
        .await;

        Ok(filled)
    }
}

/// Filter to relevant city-like places, rank them, keep the best `window`
/// and drop later duplicates of the same canonical id
#[must_use]
pub fn rank_places(query: &str, places: Vec<RawPlace>, locale: Locale, window: usize) -> Vec<CityCandidate> {
    let query = query.trim().to_lowercase();
    let mut scored: Vec<(u8, u8, CityCandidate)> = places
        .into_iter()
        .filter_map(|place| score_place(&query, place, locale))
        .collect();

    // stable: ties keep provider order
    scored.sort_by_key(|(name_rank, type_rank, _)| (*name_rank, *type_rank));
    scored.truncate(window);

    let mut seen = HashSet::new();
    scored
        .into_iter()
        .map(|(_, _, candidate)| candidate)
        .filter(|candidate| seen.insert(candidate.id.clone()))
        .collect()
}

fn score_place(query: &str, place: RawPlace, locale: Locale) -> Option<(u8, u8, CityCandidate)> {
    let Some(result_type) = place.place_type() else {
        debug!("Dropping {:?}: type {:?} not allowed", place.formatted, place.result_type);
        return None;
    };
    let name = place.suggestion_name()?;

    let name_lc = name.to_lowercase();
    let address_lc = [place.formatted.as_deref(), place.address_line1.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let first_token = name_lc.split_whitespace().next().unwrap_or_default();

    let name_rank = if name_lc.starts_with(query) {
        0
    } else if name_lc.contains(query) {
        1
    } else if address_lc.contains(query) {
        2
    } else if !first_token.is_empty() && query.contains(first_token) {
        3
    } else {
        debug!("Dropping '{}': not relevant to '{}'", name, query);
        return None;
    };
    let type_rank = u8::from(!result_type.is_major());

    let coords = place.coords();
    let candidate = CityCandidate {
        id: canonical_id(&coords),
        coords,
        city: LocalizedText::single(locale, name),
        country: LocalizedText::single(locale, place.country_name(locale)),
        result_type,
    };
    Some((name_rank, type_rank, candidate))
}
