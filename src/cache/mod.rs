//! Cache Module
//!
//! In-memory response cache with TTL expiration and insertion-order eviction.

mod entry;
mod key;
mod order;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::{CacheEntry, MAX_ENTRY_TTL};
pub use key::CacheKey;
pub use order::{EvictionIndex, Ticket};
pub use stats::{CacheCounters, CacheStats};
pub use store::CacheStore;

/// Cache handle shared between the forwarder and background tasks.
pub type SharedCache = Arc<RwLock<CacheStore>>;
