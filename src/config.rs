//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default upstream base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream API base URL, without trailing slash
    pub base_url: String,
    /// Timeout applied to each upstream attempt
    pub request_timeout: Duration,
    /// TTL in seconds for successful upstream results
    pub cache_ttl: u64,
    /// TTL in seconds for failed upstream results
    pub cache_error_ttl: u64,
    /// Maximum number of entries the cache can hold
    pub cache_max_entries: usize,
    /// Background cleanup interval in seconds, 0 disables the task
    pub cleanup_interval: u64,
    /// Total attempts per upstream call
    pub retry_attempts: u32,
    /// Delay before the first retry, doubled on each further attempt
    pub retry_backoff: Duration,
    /// HTTP server port
    pub server_port: u16,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `OPEN_METEO_BASE` - Upstream base URL (default: https://api.open-meteo.com/v1)
    /// - `REQUEST_TIMEOUT` - Per-attempt timeout in seconds, fractional allowed (default: 5)
    /// - `CACHE_TTL` - TTL in seconds for cached results (default: 60)
    /// - `CACHE_ERROR_TTL` - TTL in seconds for cached upstream errors (default: CACHE_TTL)
    /// - `CACHE_MAXSIZE` - Maximum cache entries (default: 1024)
    /// - `CACHE_CLEANUP_INTERVAL` - Expired-entry sweep interval in seconds (default: 0, off)
    /// - `RETRY_ATTEMPTS` - Total upstream attempts (default: 3)
    /// - `RETRY_BACKOFF` - First backoff delay in seconds (default: 0.3)
    /// - `PORT` - HTTP server port (default: 8080)
    /// - `LOG_LEVEL` - Log level (default: info)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<f64>().ok());

        let cache_ttl = parse_or(&lookup, "CACHE_TTL", defaults.cache_ttl);

        Self {
            base_url: lookup("OPEN_METEO_BASE")
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            request_timeout: parsed("REQUEST_TIMEOUT")
                .and_then(seconds)
                .unwrap_or(defaults.request_timeout),
            cache_ttl,
            cache_error_ttl: parse_or(&lookup, "CACHE_ERROR_TTL", cache_ttl),
            cache_max_entries: parse_or(&lookup, "CACHE_MAXSIZE", defaults.cache_max_entries),
            cleanup_interval: parse_or(&lookup, "CACHE_CLEANUP_INTERVAL", defaults.cleanup_interval),
            retry_attempts: parse_or(&lookup, "RETRY_ATTEMPTS", defaults.retry_attempts).max(1),
            retry_backoff: parsed("RETRY_BACKOFF")
                .and_then(seconds)
                .unwrap_or(defaults.retry_backoff),
            server_port: parse_or(&lookup, "PORT", defaults.server_port),
            log_level: lookup("LOG_LEVEL")
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.log_level),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(5),
            cache_ttl: 60,
            cache_error_ttl: 60,
            cache_max_entries: 1024,
            cleanup_interval: 0,
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(300),
            server_port: 8080,
            log_level: "info".to_string(),
        }
    }
}
