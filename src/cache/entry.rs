//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use crate::upstream::UpstreamResult;

/// Longest lifetime an entry can be given; larger TTLs are clamped.
pub const MAX_ENTRY_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Entry ==
/// A stored upstream result with its insertion and expiry instants.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored result
    pub value: UpstreamResult,
    /// When the entry was inserted
    pub inserted_at: Instant,
    /// When the entry stops being served
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry that lives for `ttl`.
    pub fn new(value: UpstreamResult, ttl: Duration) -> Self {
        let now = Instant::now();
        // a platform clock that cannot represent the deadline never serves the entry
        let expires_at = now.checked_add(ttl.min(MAX_ENTRY_TTL)).unwrap_or(now);

        Self {
            value,
            inserted_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration
    /// instant, so an entry inserted at T is gone at T + TTL.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against an explicit instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
