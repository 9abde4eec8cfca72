//! Response DTOs for the proxy's own endpoints
//!
//! Forwarded responses are relayed as-is; these cover health and stats.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of capacity evictions
    pub evictions: u64,
    /// Number of entries dropped after their TTL
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, always "ok"
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_from_stats() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            evictions: 1,
            expirations: 0,
            total_entries: 7,
        };

        let resp = StatsResponse::from(stats);
        assert_eq!(resp.hits, 3);
        assert_eq!(resp.evictions, 1);
        assert_eq!(resp.total_entries, 7);
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::from(CacheStats::default());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_value(HealthResponse::ok()).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].is_string());
    }
}
