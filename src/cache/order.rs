//! Eviction Index
//!
//! Orders live cache keys by insertion and by expiry so the store can pick
//! capacity victims and sweep expired entries in O(log n) per key.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::cache::CacheKey;

/// Position of one stored entry in both orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct EvictionIndex {
    /// Insertion sequence -> key; the first entry is the oldest insertion
    inserted: BTreeMap<u64, CacheKey>,
    /// (expiry, sequence) -> key; the first entry expires soonest
    expiring: BTreeMap<(Instant, u64), CacheKey>,
    next_seq: u64,
}

impl EvictionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fresh insertion of `key` expiring at `expires_at`.
    pub fn insert(&mut self, key: &CacheKey, expires_at: Instant) -> Ticket {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.inserted.insert(seq, key.clone());
        self.expiring.insert((expires_at, seq), key.clone());
        Ticket { seq, expires_at }
    }

    pub fn remove(&mut self, ticket: Ticket) {
        self.inserted.remove(&ticket.seq);
        self.expiring.remove(&(ticket.expires_at, ticket.seq));
    }

    /// Key inserted longest ago.
    pub fn oldest(&self) -> Option<&CacheKey> {
        self.inserted.values().next()
    }

    /// Keys whose expiry is at or before `now`, soonest first.
    pub fn expired(&self, now: Instant) -> Vec<CacheKey> {
        self.expiring
            .range(..=(now, u64::MAX))
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inserted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
    }
}
