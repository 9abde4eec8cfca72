//! Cache Store Module
//!
//! Response cache: HashMap storage, an insertion/expiry index for eviction and
//! lazy TTL enforcement. Lookups take `&self` so they can share a read lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::order::{EvictionIndex, Ticket};
use crate::cache::stats::CacheCounters;
use crate::cache::{CacheEntry, CacheKey, CacheStats};
use crate::upstream::UpstreamResult;

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    ticket: Ticket,
}

// == Cache Store ==
/// Size-bounded, time-bounded store of upstream results.
#[derive(Debug)]
pub struct CacheStore {
    slots: HashMap<CacheKey, Slot>,
    index: EvictionIndex,
    counters: CacheCounters,
    /// Maximum number of entries allowed, 0 disables storage
    max_entries: usize,
    /// TTL for entries stored without an explicit one
    default_ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            slots: HashMap::new(),
            index: EvictionIndex::new(),
            counters: CacheCounters::default(),
            max_entries,
            default_ttl,
        }
    }

    // == Set ==
    /// Stores a result under `key`, replacing any previous entry and resetting
    /// its insertion time.
    ///
    /// When the cache is full, expired entries are purged first; if it is
    /// still full the entry inserted longest ago is evicted.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The result to store
    /// * `ttl` - Optional TTL (uses default_ttl if None)
    pub fn set(&mut self, key: CacheKey, value: UpstreamResult, ttl: Option<Duration>) {
        if self.max_entries == 0 {
            return;
        }

        if let Some(previous) = self.slots.remove(&key) {
            self.index.remove(previous.ticket);
        } else if self.slots.len() >= self.max_entries {
            self.cleanup_expired();

            while self.slots.len() >= self.max_entries {
                let Some(oldest) = self.index.oldest().cloned() else {
                    break;
                };
                self.remove_slot(&oldest);
                self.counters.evicted();
                debug!(key = %oldest, "Evicted oldest entry");
            }
        }

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.default_ttl));
        let ticket = self.index.insert(&key, entry.expires_at);
        self.slots.insert(key, Slot { entry, ticket });
    }

    // == Get ==
    /// Retrieves the result stored under `key` if it has not expired.
    ///
    /// Expired entries read as absent and count as misses; they are removed
    /// by the next write that needs room or by `cleanup_expired`.
    pub fn get(&self, key: &CacheKey) -> Option<UpstreamResult> {
        let value = self.peek(key);
        match value {
            Some(_) => self.counters.hit(),
            None => self.counters.miss(),
        }
        value
    }

    // == Peek ==
    /// Like [`CacheStore::get`] but leaves hit/miss counters untouched.
    pub fn peek(&self, key: &CacheKey) -> Option<UpstreamResult> {
        self.slots
            .get(key)
            .filter(|slot| !slot.entry.is_expired())
            .map(|slot| slot.entry.value.clone())
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.slots.len())
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired = self.index.expired(Instant::now());
        for key in &expired {
            self.remove_slot(key);
        }

        self.counters.expired(expired.len());
        expired.len()
    }

    fn remove_slot(&mut self, key: &CacheKey) {
        if let Some(slot) = self.slots.remove(key) {
            self.index.remove(slot.ticket);
        }
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}
