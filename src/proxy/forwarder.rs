//! Forwarder
//!
//! Answers `forward(path, params)` from the cache when possible, otherwise via
//! the upstream client, storing whatever comes back (failures included).
//!
//! Misses are fetched by a spawned task rather than inside the caller's
//! future, so a client that disconnects mid-request still leaves the result
//! in the cache for the next one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error};

use crate::cache::{CacheKey, CacheStats, CacheStore, SharedCache};
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::upstream::{QueryParams, UpstreamClient, UpstreamResult};

type Pending = watch::Receiver<Option<UpstreamResult>>;
type InFlight = Arc<Mutex<HashMap<CacheKey, Pending>>>;

/// Drops the in-flight entry for `key` when the fetch task ends, even by panic.
struct InFlightGuard {
    table: InFlight,
    key: CacheKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.table.lock().remove(&self.key);
    }
}

// == Forwarder ==
/// Cache-or-fetch coordinator shared by all request handlers.
///
/// Cloning is cheap: clones share the cache and the in-flight table.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    cache: SharedCache,
    /// TTL for failed results, None = the cache's default TTL
    error_ttl: Option<Duration>,
    /// Upstream fetches currently running, by key
    in_flight: InFlight,
}

impl Forwarder {
    pub fn new(client: UpstreamClient, cache: CacheStore) -> Self {
        Self {
            client,
            cache: Arc::new(RwLock::new(cache)),
            error_ttl: None,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Stores failed results with their own TTL.
    pub fn with_error_ttl(mut self, ttl: Duration) -> Self {
        self.error_ttl = Some(ttl);
        self
    }

    /// Builds the client and cache from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = UpstreamClient::from_config(config)?;
        let cache = CacheStore::new(
            config.cache_max_entries,
            Duration::from_secs(config.cache_ttl),
        );

        Ok(Self::new(client, cache).with_error_ttl(Duration::from_secs(config.cache_error_ttl)))
    }

    /// Shared handle to the underlying cache.
    pub fn cache(&self) -> SharedCache {
        Arc::clone(&self.cache)
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    // == Forward ==
    /// Returns the cached result for `(path, params)` or fetches and caches it.
    ///
    /// Concurrent misses on the same key share a single upstream call. The
    /// call runs to completion and is cached even if every caller waiting on
    /// it is dropped.
    pub async fn forward(&self, path: &str, params: &QueryParams) -> UpstreamResult {
        let key = CacheKey::new(path, params);

        if let Some(hit) = self.cache.read().await.get(&key) {
            debug!(key = %key, "Cache hit");
            return hit;
        }
        debug!(key = %key, "Cache miss");

        let mut pending = self.subscribe(key, path, params);
        let outcome = pending
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|value| (*value).clone());

        outcome.unwrap_or_else(|| {
            error!(path = %path, "Upstream fetch task ended without a result");
            UpstreamResult::from_error(&ProxyError::Internal(
                "upstream fetch task ended without a result".to_string(),
            ))
        })
    }

    /// Joins the running fetch for `key`, or starts one.
    fn subscribe(&self, key: CacheKey, path: &str, params: &QueryParams) -> Pending {
        let mut in_flight = self.in_flight.lock();
        if let Some(pending) = in_flight.get(&key) {
            debug!(key = %key, "Joining in-flight fetch");
            return pending.clone();
        }

        let (tx, rx) = watch::channel(None);
        in_flight.insert(key.clone(), rx.clone());

        let guard = InFlightGuard {
            table: Arc::clone(&self.in_flight),
            key: key.clone(),
        };
        let worker = self.clone();
        let path = path.to_string();
        let params = params.clone();

        tokio::spawn(async move {
            let result = worker.fetch_and_store(&key, &path, &params).await;
            // later misses find the value in the cache, not this entry
            drop(guard);
            let _ = tx.send(Some(result));
        });

        rx
    }

    async fn fetch_and_store(
        &self,
        key: &CacheKey,
        path: &str,
        params: &QueryParams,
    ) -> UpstreamResult {
        // another fetch may have stored the key after our miss
        if let Some(hit) = self.cache.read().await.peek(key) {
            return hit;
        }

        let result = self.client.fetch(path, params).await;
        let ttl = if result.is_error { self.error_ttl } else { None };

        self.cache.write().await.set(key.clone(), result.clone(), ttl);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{Payload, RetryPolicy};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forwarder(base_url: &str, ttl: Duration) -> Forwarder {
        let client = UpstreamClient::new(
            base_url,
            Duration::from_secs(2),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .unwrap();
        Forwarder::new(client, CacheStore::new(100, ttl))
    }

    fn coords(lat: &str, lon: &str) -> QueryParams {
        QueryParams::from([
            ("latitude".to_string(), lat.to_string()),
            ("longitude".to_string(), lon.to_string()),
        ])
    }

    async fn slow_forecast(mock_server: &MockServer, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"temp": 21}))
                    .set_delay(delay),
            )
            .expect(1)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("latitude", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temp": 21})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let forwarder = forwarder(&mock_server.uri(), Duration::from_secs(60));

        let first = forwarder.forward("forecast", &coords("10", "20")).await;
        let second = forwarder.forward("forecast", &coords("10", "20")).await;

        assert_eq!(first.status, 200);
        assert_eq!(first.payload, Payload::Json(json!({"temp": 21})));
        assert_eq!(first, second);

        let stats = forwarder.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_different_params_miss() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temp": 21})))
            .expect(2)
            .mount(&mock_server)
            .await;

        let forwarder = forwarder(&mock_server.uri(), Duration::from_secs(60));

        forwarder.forward("forecast", &coords("10", "20")).await;
        forwarder.forward("forecast", &coords("11", "20")).await;
    }

    #[tokio::test]
    async fn test_failures_are_cached() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&mock_server)
            .await;

        let forwarder = forwarder(&mock_server.uri(), Duration::from_secs(60));

        let first = forwarder.forward("forecast", &coords("10", "20")).await;
        let second = forwarder.forward("forecast", &coords("10", "20")).await;

        assert_eq!(first.status, 502);
        assert!(first.is_error);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temp": 21})))
            .expect(2)
            .mount(&mock_server)
            .await;

        let forwarder = forwarder(&mock_server.uri(), Duration::from_millis(50));

        forwarder.forward("forecast", &coords("10", "20")).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        forwarder.forward("forecast", &coords("10", "20")).await;
    }

    #[tokio::test]
    async fn test_error_ttl_shorter_than_success_ttl() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(3)
            .expect(3)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temp": 3})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let forwarder = forwarder(&mock_server.uri(), Duration::from_secs(60))
            .with_error_ttl(Duration::from_millis(50));

        let failed = forwarder.forward("forecast", &coords("10", "20")).await;
        assert_eq!(failed.status, 502);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let recovered = forwarder.forward("forecast", &coords("10", "20")).await;
        assert_eq!(recovered.status, 200);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_upstream_call() {
        let mock_server = MockServer::start().await;
        slow_forecast(&mock_server, Duration::from_millis(200)).await;

        let forwarder = Arc::new(forwarder(&mock_server.uri(), Duration::from_secs(60)));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let forwarder = Arc::clone(&forwarder);
                tokio::spawn(async move { forwarder.forward("forecast", &coords("10", "20")).await })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result.payload, Payload::Json(json!({"temp": 21})));
        }

        assert!(forwarder.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_request_still_caches_result() {
        let mock_server = MockServer::start().await;
        slow_forecast(&mock_server, Duration::from_millis(200)).await;

        let forwarder = forwarder(&mock_server.uri(), Duration::from_secs(60));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            forwarder.forward("forecast", &coords("10", "20")),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(forwarder.stats().await.total_entries, 1);
        assert!(forwarder.in_flight.lock().is_empty());

        let cached = forwarder.forward("forecast", &coords("10", "20")).await;
        assert_eq!(cached.payload, Payload::Json(json!({"temp": 21})));
        assert_eq!(forwarder.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_caller_joins_fetch_started_by_dropped_caller() {
        let mock_server = MockServer::start().await;
        slow_forecast(&mock_server, Duration::from_millis(200)).await;

        let forwarder = forwarder(&mock_server.uri(), Duration::from_secs(60));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            forwarder.forward("forecast", &coords("10", "20")),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(forwarder.in_flight.lock().len(), 1);

        let joined = forwarder.forward("forecast", &coords("10", "20")).await;

        assert_eq!(joined.status, 200);
        assert_eq!(joined.payload, Payload::Json(json!({"temp": 21})));
        assert!(forwarder.in_flight.lock().is_empty());
    }
}
