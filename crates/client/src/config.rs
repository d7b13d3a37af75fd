use std::time::Duration;

use crate::error::ClientError;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a
/// backend on `localhost:5000`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend REST base URL, without trailing slash.
    pub api_base_url: String,
    /// Static bearer token; `None` means no session.
    pub api_token: Option<String>,
    /// Geocoding service base URL, without trailing slash.
    pub geocoder_base_url: String,
    /// `User-Agent` sent to the geocoding service (required by Nominatim).
    pub geocoder_user_agent: String,
    /// Maximum number of candidates per forward search.
    pub search_result_limit: u32,
    /// Quiet interval before a debounced search fires.
    pub search_debounce: Duration,
    /// Per-request timeout for every outbound call.
    pub request_timeout: Duration,
}

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Default geocoding service.
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Default debounce interval for location search, in milliseconds.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            geocoder_base_url: DEFAULT_GEOCODER_BASE_URL.to_string(),
            geocoder_user_agent: default_user_agent(),
            search_result_limit: 5,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                               |
    /// |------------------------|---------------------------------------|
    /// | `API_BASE_URL`         | `http://localhost:5000`               |
    /// | `API_TOKEN`            | unset                                 |
    /// | `GEOCODER_BASE_URL`    | `https://nominatim.openstreetmap.org` |
    /// | `GEOCODER_USER_AGENT`  | `wayfarer/<version>`                  |
    /// | `SEARCH_RESULT_LIMIT`  | `5`                                   |
    /// | `SEARCH_DEBOUNCE_MS`   | `300`                                 |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                  |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_base_url = get("API_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let geocoder_base_url = get("GEOCODER_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.geocoder_base_url);

        let search_result_limit = match get("SEARCH_RESULT_LIMIT") {
            Some(v) => parse_number("SEARCH_RESULT_LIMIT", &v)?,
            None => defaults.search_result_limit,
        };

        let search_debounce = match get("SEARCH_DEBOUNCE_MS") {
            Some(v) => Duration::from_millis(parse_number("SEARCH_DEBOUNCE_MS", &v)?),
            None => defaults.search_debounce,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", &v)?),
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_base_url,
            api_token: get("API_TOKEN"),
            geocoder_base_url,
            geocoder_user_agent: get("GEOCODER_USER_AGENT")
                .unwrap_or(defaults.geocoder_user_agent),
            search_result_limit,
            search_debounce,
            request_timeout,
        })
    }
}

fn default_user_agent() -> String {
    format!("wayfarer/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ClientError> {
    raw.parse()
        .map_err(|_| ClientError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}
