//! Upstream Module
//!
//! HTTP client for the upstream weather API with retry and backoff.

mod client;
mod result;
mod retry;

use std::collections::HashMap;

pub use client::UpstreamClient;
pub use result::{Payload, UpstreamResult};
pub use retry::{parse_retry_after, RetryPolicy, MAX_BACKOFF, RETRYABLE_STATUSES};

/// Query parameters forwarded upstream.
pub type QueryParams = HashMap<String, String>;
