//! Incremental search driven by keystrokes
//!
//! Each keystroke restarts a debounce timer; when it fires, a new search
//! session is issued with a strictly increasing token. Results are applied
//! only while their session is still the latest one issued, so a slow
//! response to an earlier keystroke can never overwrite a newer result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::models::{CityCandidate, Locale};
use crate::suggestions::GeocodeQueryResolver;

/// Monotonic identifier of a search session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

/// One issued fetch for one query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSession {
    pub token: SessionToken,
    pub query: String,
    pub locale: Locale,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Debouncing,
    Fetching,
    Settled,
}

/// What the UI renders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchSnapshot {
    pub suggestions: Vec<CityCandidate>,
    pub loading: bool,
    /// Distinguishes "never queried" from "queried, zero results"
    pub has_searched: bool,
    pub phase: SearchPhase,
    /// Set only for configuration failures; provider failures look like
    /// zero results
    pub error: Option<String>,
}

/// Debounced, last-session-wins driver over [`GeocodeQueryResolver`]
pub struct SuggestionSearch {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: Arc<GeocodeQueryResolver>,
    debounce: Duration,
    latest: AtomicU64,
    state: watch::Sender<SearchSnapshot>,
    timer: Mutex<Option<JoinHandle<()>>>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl SuggestionSearch {
    pub fn new(resolver: Arc<GeocodeQueryResolver>) -> Self {
        Self::with_debounce(resolver, Duration::from_millis(400))
    }

    pub fn with_debounce(resolver: Arc<GeocodeQueryResolver>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                resolver,
                debounce,
                latest: AtomicU64::new(0),
                state,
                timer: Mutex::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Handle a keystroke. Only the query present when the debounce timer
    /// fires is searched. Must be called within a tokio runtime.
    pub fn on_input(&self, query: &str, locale: Locale) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }

        if !self.inner.resolver.settings().accepts(query) {
            self.inner.reset();
            return;
        }

        self.inner.state.send_modify(|s| s.phase = SearchPhase::Debouncing);

        let inner = Arc::clone(&self.inner);
        let query = query.trim().to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.start_session(query, locale);
        });
        *self.inner.timer.lock() = Some(timer);
    }

    /// Issue a session immediately, bypassing the debounce timer. Returns
    /// `None` (and resets to idle) when the query is too short.
    pub fn start_search_session(&self, query: &str, locale: Locale) -> Option<SearchSession> {
        if !self.inner.resolver.settings().accepts(query) {
            self.inner.reset();
            return None;
        }
        Some(self.inner.start_session(query.trim().to_string(), locale))
    }

    /// Drop every pending and in-flight search and return to idle
    pub fn clear(&self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
        self.inner.reset();
    }

    #[must_use]
    pub fn is_current(&self, session: &SearchSession) -> bool {
        self.inner.is_current(session.token)
    }
}

impl Drop for SuggestionSearch {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
        if let Some(task) = self.inner.in_flight.lock().take() {
            task.abort();
        }
    }
}

impl Inner {
    fn issue_token(&self) -> SessionToken {
        SessionToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_current(&self, token: SessionToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    fn start_session(self: &Arc<Self>, query: String, locale: Locale) -> SearchSession {
        let session = SearchSession {
            token: self.issue_token(),
            query,
            locale,
            issued_at: Utc::now(),
        };
        debug!("Issued search session {:?} for '{}'", session.token, session.query);

        self.state.send_modify(|s| {
            s.loading = true;
            s.phase = SearchPhase::Fetching;
            s.error = None;
        });

        let inner = Arc::clone(self);
        let task_session = session.clone();
        let task = tokio::spawn(async move { inner.fetch(task_session).await });
        if let Some(previous) = self.in_flight.lock().replace(task) {
            previous.abort();
        }
        session
    }

    async fn fetch(&self, session: SearchSession) {
        let result = self
            .resolver
            .resolve_suggestions(&session.query, session.locale)
            .await;

        let applied = self.state.send_if_modified(|s| {
            if !self.is_current(session.token) {
                return false;
            }
            match &result {
                Ok(candidates) => {
                    s.suggestions = candidates.clone();
                    s.error = None;
                }
                Err(e) => {
                    error!("Search session {:?} failed: {}", session.token, e);
                    s.suggestions.clear();
                    s.error = Some(e.user_message());
                }
            }
            s.loading = false;
            s.has_searched = true;
            s.phase = SearchPhase::Settled;
            true
        });

        if !applied {
            debug!("Discarded results of superseded session {:?}", session.token);
        }
    }

    fn reset(&self) {
        // invalidates whatever is still in flight
        self.issue_token();
        if let Some(task) = self.in_flight.lock().take() {
            task.abort();
        }
        self.state.send_replace(SearchSnapshot::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CityWeatherError;
    use crate::providers::fakes::{FakeGeocoder, place};

    fn coordinator(geocoder: FakeGeocoder) -> (Arc<FakeGeocoder>, SuggestionSearch) {
        let geocoder = Arc::new(geocoder);
        let resolver = GeocodeQueryResolver::new(geocoder.clone(), geocoder.clone());
        (geocoder, SuggestionSearch::new(Arc::new(resolver)))
    }

    fn london_and_lod() -> FakeGeocoder {
        FakeGeocoder::default()
            .with_search("Lo", Locale::En, vec![place(31.9516, 34.8953, "Lod", "IL", "city")])
            .with_search("London", Locale::En, vec![place(51.5074, -0.1278, "London", "GB", "city")])
    }

    fn settle() -> tokio::time::Sleep {
        tokio::time::sleep(Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_stays_idle_without_fetch() {
        let (geocoder, search) = coordinator(london_and_lod());
        search.on_input("L", Locale::En);
        search.on_input("", Locale::En);
        settle().await;

        assert_eq!(search.snapshot(), SearchSnapshot::default());
        assert!(!search.snapshot().has_searched);
        assert_eq!(geocoder.search_calls(), 0);
        assert!(search.start_search_session("L", Locale::En).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_fetches_only_last_query() {
        let (geocoder, search) = coordinator(london_and_lod());
        search.on_input("Lo", Locale::En);
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.on_input("Lond", Locale::En);
        tokio::time::sleep(Duration::from_millis(100)).await;
        search.on_input("London", Locale::En);
        assert_eq!(search.snapshot().phase, SearchPhase::Debouncing);
        settle().await;

        assert_eq!(geocoder.search_calls(), 1);
        let snapshot = search.snapshot();
        assert_eq!(snapshot.suggestions.len(), 1);
        assert_eq!(snapshot.suggestions[0].city.en, "London");
        assert!(snapshot.has_searched);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.phase, SearchPhase::Settled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_earlier_session_never_wins() {
        let geocoder = london_and_lod()
            .with_delay("Lo", Duration::from_millis(300))
            .with_delay("London", Duration::from_millis(50));
        let (_, search) = coordinator(geocoder);

        let first = search.start_search_session("Lo", Locale::En).unwrap();
        let second = search.start_search_session("London", Locale::En).unwrap();
        assert!(second.token > first.token);
        assert!(!search.is_current(&first));
        settle().await;

        let snapshot = search.snapshot();
        assert_eq!(snapshot.suggestions.len(), 1);
        assert_eq!(snapshot.suggestions[0].city.en, "London");
        assert!(search.is_current(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_of_superseded_session_is_discarded() {
        let geocoder = london_and_lod().with_delay("Lo", Duration::from_millis(300));
        let (geocoder, search) = coordinator(geocoder);

        let stale = search.start_search_session("Lo", Locale::En).unwrap();
        search.start_search_session("London", Locale::En).unwrap();
        settle().await;
        let settled = search.snapshot();
        assert_eq!(settled.suggestions[0].city.en, "London");

        // the "Lo" fetch completes after "London" was applied
        let mut updates = search.subscribe();
        let calls_before = geocoder.search_calls();
        search.inner.fetch(stale).await;

        assert!(geocoder.search_calls() > calls_before);
        assert!(!updates.has_changed().unwrap());
        assert_eq!(search.snapshot(), settled);
        assert!(search.snapshot().has_searched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_while_fetching() {
        let geocoder = london_and_lod().with_delay("London", Duration::from_millis(500));
        let (_, search) = coordinator(geocoder);
        let mut updates = search.subscribe();

        search.start_search_session("London", Locale::En);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(search.snapshot().loading);
        assert_eq!(search.snapshot().phase, SearchPhase::Fetching);

        settle().await;
        assert!(updates.has_changed().unwrap());
        let latest = updates.borrow_and_update().clone();
        assert!(!latest.loading);
        assert_eq!(latest.suggestions[0].city.en, "London");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_results_marks_searched() {
        let (_, search) = coordinator(FakeGeocoder::default());
        search.start_search_session("Atlantis", Locale::En);
        settle().await;

        let snapshot = search.snapshot();
        assert!(snapshot.suggestions.is_empty());
        assert!(snapshot.has_searched);
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_below_min_length_returns_to_idle() {
        let geocoder = london_and_lod().with_delay("London", Duration::from_millis(500));
        let (_, search) = coordinator(geocoder);
        search.start_search_session("Lo", Locale::En);
        settle().await;
        assert!(search.snapshot().has_searched);

        search.start_search_session("London", Locale::En);
        search.on_input("L", Locale::En);
        settle().await;
        assert_eq!(search.snapshot(), SearchSnapshot::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_credential_surfaces_error() {
        let geocoder = FakeGeocoder::default().failing_with(CityWeatherError::config("no key"));
        let (_, search) = coordinator(geocoder);
        search.on_input("Paris", Locale::En);
        settle().await;

        let snapshot = search.snapshot();
        assert!(snapshot.error.is_some());
        assert!(snapshot.suggestions.is_empty());
        assert!(!snapshot.loading);
    }
}
