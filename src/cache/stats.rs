//! Cache counters
//!
//! Lookups run under a shared lock, so counters are atomics and `CacheStats`
//! is a point-in-time snapshot of them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of cache activity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing or only an expired entry
    pub misses: u64,
    /// Entries dropped to make room for new ones
    pub evictions: u64,
    /// Expired entries removed from the store
    pub expirations: u64,
    /// Entries currently held
    pub total_entries: usize,
}

impl CacheStats {
    /// hits / (hits + misses), 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }
}

/// Live counters owned by a `CacheStore`.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl CacheCounters {
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn evicted(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn expired(&self, count: usize) {
        self.expirations.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            total_entries,
        }
    }
}
