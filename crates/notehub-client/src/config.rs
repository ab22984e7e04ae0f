//! Client configuration from environment variables.

use std::env;
use std::time::Duration;

use notehub_core::DEFAULT_PER_PAGE;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default search debounce window in milliseconds.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 1000;

/// Default freshness window of fetched data, in seconds.
pub const DEFAULT_STALE_SECS: u64 = 60;

/// Default idle time before an unused cache entry is collected, in seconds.
pub const DEFAULT_GC_SECS: u64 = 300;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the NoteHub API, without a trailing slash.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Notes per listing page.
    pub per_page: u32,
    /// Quiescence window of the search box.
    pub search_debounce: Duration,
    /// How long fetched data counts as fresh.
    pub stale_time: Duration,
    /// How long an unobserved cache entry is kept.
    pub gc_time: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            per_page: DEFAULT_PER_PAGE,
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            stale_time: Duration::from_secs(DEFAULT_STALE_SECS),
            gc_time: Duration::from_secs(DEFAULT_GC_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `NOTEHUB_URL`: API base URL (default: http://localhost:3000)
    /// - `NOTEHUB_TOKEN`: Bearer token
    /// - `NOTEHUB_PER_PAGE`: Notes per page (default: 12)
    /// - `NOTEHUB_SEARCH_DEBOUNCE_MS`: Search debounce window (default: 1000)
    /// - `NOTEHUB_STALE_SECS`: Freshness window of cached data (default: 60)
    /// - `NOTEHUB_GC_SECS`: Idle time before cache collection (default: 300)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = lookup("NOTEHUB_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                name: "NOTEHUB_URL".to_string(),
                reason: format!("expected an http(s) URL, got {:?}", base_url),
            });
        }

        let token = lookup("NOTEHUB_TOKEN").filter(|t| !t.trim().is_empty());

        let per_page = parse_var(&lookup, "NOTEHUB_PER_PAGE")?.unwrap_or(defaults.per_page);
        if per_page == 0 {
            return Err(ConfigError::InvalidValue {
                name: "NOTEHUB_PER_PAGE".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let search_debounce = parse_var(&lookup, "NOTEHUB_SEARCH_DEBOUNCE_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.search_debounce);
        let stale_time = parse_var(&lookup, "NOTEHUB_STALE_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.stale_time);
        let gc_time = parse_var(&lookup, "NOTEHUB_GC_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.gc_time);

        Ok(Self {
            base_url,
            token,
            per_page,
            search_debounce,
            stale_time,
            gc_time,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                name: name.to_string(),
                reason: e.to_string(),
            }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
