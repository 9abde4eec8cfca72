//! Retry Policy Module
//!
//! Attempt budget, exponential backoff and the set of transient statuses.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Statuses treated as transient and retried.
pub const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Statuses whose `Retry-After` header is honored.
const RETRY_AFTER_STATUSES: &[u16] = &[429, 503];

/// Upper bound for any single backoff sleep.
pub const MAX_BACKOFF: Duration = Duration::from_secs(120);

// == Retry Policy ==
/// Retry configuration for idempotent upstream GETs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_backoff: Duration,
    /// Cap on any single computed delay
    pub max_backoff: Duration,
    /// Cap on a server-requested `Retry-After` wait
    pub max_retry_after: Duration,
    /// Statuses that trigger another attempt
    pub retryable_statuses: &'static [u16],
}

impl Default for RetryPolicy {
    /// Three attempts, sleeping 0.3s then 0.6s.
    fn default() -> Self {
        Self::new(3, Duration::from_millis(300))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: MAX_BACKOFF,
            max_retry_after: MAX_BACKOFF,
            retryable_statuses: RETRYABLE_STATUSES,
        }
    }

    /// Limits how long a `Retry-After` header can hold up the next attempt.
    pub fn with_max_retry_after(mut self, cap: Duration) -> Self {
        self.max_retry_after = cap;
        self
    }

    /// Whether `status` is transient.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Backoff after the given failed attempt: `initial * 2^(attempt - 1)`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Delay before the next attempt, preferring the server's `Retry-After`.
    pub fn next_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(wait) => wait.min(self.max_retry_after),
            None => self.delay_for(attempt),
        }
    }

    /// Reads `Retry-After` for statuses that carry it.
    pub fn retry_after(&self, status: u16, headers: &HeaderMap) -> Option<Duration> {
        if !RETRY_AFTER_STATUSES.contains(&status) {
            return None;
        }
        headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| parse_retry_after(value, Utc::now()))
    }
}

/// Parses delta-seconds or an HTTP-date relative to `now`.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    // a date in the past means retry immediately
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
