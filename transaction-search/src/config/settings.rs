//! Service settings loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::AppError;
use transaction_search_repository::DEFAULT_INDEX_NAME;
use transaction_search_shared::{DEFAULT_BATCH_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_SCROLL_TIMEOUT_SECS};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default HTTP listen address.
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default lifetime of a cached search response (24 hours).
const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// Default number of cached search responses.
const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(AppError::config(format!("Unknown LOG_FORMAT: {}", other))),
        }
    }
}

/// Runtime settings for the service.
#[derive(Debug, Clone)]
pub struct Settings {
    pub opensearch_url: String,
    pub index_name: String,
    pub listen_addr: SocketAddr,
    pub batch_size: usize,
    pub page_size: usize,
    pub scroll_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: NonZeroUsize,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_INDEX`: Index name (default: transactions)
    /// - `HTTP_LISTEN_ADDR`: HTTP listen address (default: 0.0.0.0:8080)
    /// - `INGEST_BATCH_SIZE`: Records per bulk request (default: 1000)
    /// - `SCROLL_PAGE_SIZE`: Records per scroll page (default: 1000)
    /// - `SCROLL_TIMEOUT_SECS`: Scroll context lifetime (default: 120)
    /// - `QUERY_CACHE_TTL_SECS`: Search response cache lifetime (default: 86400)
    /// - `QUERY_CACHE_CAPACITY`: Maximum cached search responses (default: 1024)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let opensearch_url =
            lookup("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string());
        let index_name =
            lookup("OPENSEARCH_INDEX").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());

        let listen_addr = parse_or(&lookup, "HTTP_LISTEN_ADDR", || {
            DEFAULT_LISTEN_ADDR.parse::<SocketAddr>().map_err(|e| AppError::config(e.to_string()))
        })?;

        let batch_size = parse_or(&lookup, "INGEST_BATCH_SIZE", || Ok(DEFAULT_BATCH_SIZE))?;
        let page_size = parse_or(&lookup, "SCROLL_PAGE_SIZE", || Ok(DEFAULT_PAGE_SIZE))?;
        let scroll_timeout_secs =
            parse_or(&lookup, "SCROLL_TIMEOUT_SECS", || Ok(DEFAULT_SCROLL_TIMEOUT_SECS))?;
        let cache_ttl_secs = parse_or(&lookup, "QUERY_CACHE_TTL_SECS", || Ok(DEFAULT_CACHE_TTL_SECS))?;
        let cache_capacity: usize =
            parse_or(&lookup, "QUERY_CACHE_CAPACITY", || Ok(DEFAULT_CACHE_CAPACITY))?;
        let log_format = parse_or(&lookup, "LOG_FORMAT", || Ok(LogFormat::Pretty))?;

        if page_size == 0 {
            return Err(AppError::config("SCROLL_PAGE_SIZE must be greater than zero"));
        }
        if scroll_timeout_secs == 0 {
            return Err(AppError::config("SCROLL_TIMEOUT_SECS must be greater than zero"));
        }
        let cache_capacity = NonZeroUsize::new(cache_capacity)
            .ok_or_else(|| AppError::config("QUERY_CACHE_CAPACITY must be greater than zero"))?;

        Ok(Self {
            opensearch_url,
            index_name,
            listen_addr,
            batch_size,
            page_size,
            scroll_timeout: Duration::from_secs(scroll_timeout_secs),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_capacity,
            log_format,
        })
    }
}

/// Parse `key` if it is set, otherwise fall back to `default`.
fn parse_or<F, T, D>(lookup: &F, key: &str, default: D) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> Result<T, AppError>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.opensearch_url, "http://localhost:9200");
        assert_eq!(settings.index_name, "transactions");
        assert_eq!(settings.listen_addr.port(), 8080);
        assert_eq!(settings.batch_size, 1000);
        assert_eq!(settings.page_size, 1000);
        assert_eq!(settings.scroll_timeout, Duration::from_secs(120));
        assert_eq!(settings.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(settings.cache_capacity.get(), 1024);
        assert_eq!(settings.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("OPENSEARCH_URL", "http://search:9200"),
            ("OPENSEARCH_INDEX", "mttq"),
            ("HTTP_LISTEN_ADDR", "127.0.0.1:3000"),
            ("INGEST_BATCH_SIZE", "500"),
            ("SCROLL_TIMEOUT_SECS", "30"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(settings.opensearch_url, "http://search:9200");
        assert_eq!(settings.index_name, "mttq");
        assert_eq!(settings.listen_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(settings.batch_size, 500);
        assert_eq!(settings.scroll_timeout, Duration::from_secs(30));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            settings(&[("INGEST_BATCH_SIZE", "lots")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            settings(&[("QUERY_CACHE_CAPACITY", "0")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            settings(&[("LOG_FORMAT", "xml")]),
            Err(AppError::Config(_))
        ));
    }
}
