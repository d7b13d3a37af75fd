//! Location search and reverse geocoding.
//!
//! [`Geocoder`] is the seam to the public geocoding service and
//! [`NominatimGeocoder`] talks to Nominatim over HTTP. [`LocationSearch`]
//! adds the form-facing rules: blank queries never hit the network, and a
//! failed reverse lookup is not an error. [`DebouncedSearch`] collapses a
//! burst of keystrokes into one search for the last query.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use wayfarer_core::validation::EntryDraft;

use crate::config::ClientConfig;
use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Geocoder seam
// ---------------------------------------------------------------------------

/// One forward-search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceCandidate {
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward search for places matching `query`.
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, ClientError>;

    /// Display name for a point, or `None` when the service has none.
    async fn reverse(&self, lat: f64, lng: f64) -> Result<Option<String>, ClientError>;
}

/// Trimmed query, or `None` if there is nothing to search for.
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

// ---------------------------------------------------------------------------
// NominatimGeocoder
// ---------------------------------------------------------------------------

/// [`Geocoder`] backed by a Nominatim instance.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: Value,
    lon: Value,
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl NominatimGeocoder {
    /// Nominatim's usage policy requires an identifying `User-Agent`.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(config.geocoder_user_agent.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build geocoder client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.geocoder_base_url.trim_end_matches('/').to_string(),
            limit: config.search_result_limit,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response, ClientError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status.as_u16(), body));
        }
        Ok(response)
    }
}

fn coordinate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, ClientError> {
        let params = [
            ("format", "json".to_string()),
            ("q", query.to_string()),
            ("limit", self.limit.to_string()),
        ];
        let places: Vec<NominatimPlace> = self.get("/search", &params).await?.json().await?;

        Ok(places
            .into_iter()
            .filter_map(|p| {
                Some(PlaceCandidate {
                    lat: coordinate(&p.lat)?,
                    lng: coordinate(&p.lon)?,
                    display_name: p.display_name,
                })
            })
            .collect())
    }

    async fn reverse(&self, lat: f64, lng: f64) -> Result<Option<String>, ClientError> {
        let params = [
            ("format", "json".to_string()),
            ("lat", lat.to_string()),
            ("lon", lng.to_string()),
        ];
        let place: NominatimReverse = self.get("/reverse", &params).await?.json().await?;

        if let Some(reason) = place.error {
            tracing::debug!(lat, lng, %reason, "No place at point");
        }
        Ok(place.display_name)
    }
}

// ---------------------------------------------------------------------------
// LocationSearch
// ---------------------------------------------------------------------------

/// Form-facing location lookups.
#[derive(Clone)]
pub struct LocationSearch {
    geocoder: Arc<dyn Geocoder>,
}

impl LocationSearch {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Search for places; blank queries return nothing without a request.
    pub async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, ClientError> {
        match normalize_query(query) {
            Some(q) => self.geocoder.search(q).await,
            None => Ok(Vec::new()),
        }
    }

    /// Place name for a point. Failures are logged and become `None`.
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Option<String> {
        match self.geocoder.reverse(lat, lng).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(lat, lng, error = %e, "Reverse geocode failed, location left for manual entry");
                None
            }
        }
    }

    /// Apply a map click to a draft: set coordinates, and fill the
    /// location only when a place name was found.
    pub async fn fill_draft_location(&self, draft: &mut EntryDraft, lat: f64, lng: f64) {
        let place = self.reverse_geocode(lat, lng).await;
        draft.select_point(lat, lng, place);
    }

    /// Debounced search over this geocoder.
    pub fn debounced(&self, delay: Duration) -> DebouncedSearch {
        DebouncedSearch::new(self.clone(), delay)
    }
}

// ---------------------------------------------------------------------------
// DebouncedSearch
// ---------------------------------------------------------------------------

/// Latest published search outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub candidates: Vec<PlaceCandidate>,
    /// Set when the search itself failed.
    pub error: Option<String>,
}

/// Search-as-you-type with a quiet interval.
///
/// Every [`input`](Self::input) cancels the scheduled search (and any
/// search still in flight) and schedules a new one after `delay`. At most
/// one search is outstanding, and results for superseded queries are
/// never published. Results arrive on the channel from
/// [`subscribe`](Self::subscribe).
pub struct DebouncedSearch {
    search: LocationSearch,
    delay: Duration,
    pending: Arc<Mutex<Option<CancellationToken>>>,
    results: Arc<watch::Sender<SearchResults>>,
}

impl DebouncedSearch {
    pub fn new(search: LocationSearch, delay: Duration) -> Self {
        let (tx, _) = watch::channel(SearchResults::default());
        Self {
            search,
            delay,
            pending: Arc::new(Mutex::new(None)),
            results: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchResults> {
        self.results.subscribe()
    }

    /// Most recently published results.
    pub fn latest(&self) -> SearchResults {
        self.results.borrow().clone()
    }

    /// Record a keystroke. Must be called from within a tokio runtime.
    pub fn input(&self, query: &str) {
        let token = CancellationToken::new();
        self.swap_pending(Some(token.clone()));

        if normalize_query(query).is_none() {
            self.swap_pending(None);
            self.results.send_replace(SearchResults {
                query: query.to_string(),
                ..Default::default()
            });
            return;
        }

        let search = self.search.clone();
        let pending = Arc::clone(&self.pending);
        let results = Arc::clone(&self.results);
        let delay = self.delay;
        let query = query.to_string();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = search.search(&query) => outcome,
            };

            let published = match outcome {
                Ok(candidates) => SearchResults {
                    query,
                    candidates,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(%query, error = %e, "Location search failed");
                    SearchResults {
                        query,
                        candidates: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            };

            publish_unless_cancelled(&pending, &token, &results, published);
        });
    }

    /// Drop the scheduled search, if any.
    pub fn cancel(&self) {
        self.swap_pending(None);
    }

    /// The previous token is cancelled while the lock is held, so a
    /// search that publishes under the same lock never sees it half-swapped.
    fn swap_pending(&self, next: Option<CancellationToken>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = std::mem::replace(&mut *pending, next) {
            previous.cancel();
        }
    }
}

/// Publish `outcome` unless `token` was superseded. The check and the send
/// happen under the `pending` lock, so a newer keystroke either lands
/// before (and the outcome is dropped) or after (and replaces it).
fn publish_unless_cancelled(
    pending: &Mutex<Option<CancellationToken>>,
    token: &CancellationToken,
    results: &watch::Sender<SearchResults>,
    outcome: SearchResults,
) -> bool {
    let _guard = pending.lock().unwrap_or_else(PoisonError::into_inner);
    if token.is_cancelled() {
        return false;
    }
    results.send_replace(outcome);
    true
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_normalize_to_none() {
        assert_eq!(normalize_query(""), None);
        assert_eq!(normalize_query("   \t"), None);
        assert_eq!(normalize_query("  Paris "), Some("Paris"));
    }

    #[test]
    fn coordinates_parse_from_strings_and_numbers() {
        assert_eq!(coordinate(&Value::from("48.5")), Some(48.5));
        assert_eq!(coordinate(&serde_json::json!(2.25)), Some(2.25));
        assert_eq!(coordinate(&Value::Null), None);
    }

    #[test]
    fn nominatim_builds_from_config() {
        let config = ClientConfig {
            geocoder_base_url: "http://geo.local/".into(),
            ..Default::default()
        };
        let geocoder = NominatimGeocoder::new(&config).unwrap();
        assert_eq!(geocoder.base_url, "http://geo.local");
        assert_eq!(geocoder.limit, 5);
    }

    #[test]
    fn superseded_search_does_not_publish() {
        let (tx, _rx) = watch::channel(SearchResults::default());
        let pending = Mutex::new(None);
        let stale = CancellationToken::new();
        *pending.lock().unwrap() = Some(stale.clone());

        // A newer keystroke swaps in its own token and cancels the old one.
        if let Some(previous) = pending.lock().unwrap().replace(CancellationToken::new()) {
            previous.cancel();
        }

        let outcome = SearchResults {
            query: "Pa".into(),
            ..Default::default()
        };
        assert!(!publish_unless_cancelled(&pending, &stale, &tx, outcome));
        assert_eq!(tx.borrow().query, "");
    }

    #[test]
    fn current_search_publishes() {
        let (tx, _rx) = watch::channel(SearchResults::default());
        let token = CancellationToken::new();
        let pending = Mutex::new(Some(token.clone()));

        let outcome = SearchResults {
            query: "Par".into(),
            ..Default::default()
        };
        assert!(publish_unless_cancelled(&pending, &token, &tx, outcome));
        assert_eq!(tx.borrow().query, "Par");
    }
}
