//! TTL Cleanup Task
//!
//! Optional background task that sweeps expired cache entries. Expiry is
//! already enforced on lookup; the sweep only releases memory held by entries
//! nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a task that removes expired entries every `cleanup_interval_secs`.
///
/// Returns None when the interval is 0. The returned handle can be aborted
/// during graceful shutdown.
pub fn spawn_cleanup_task(
    cache: SharedCache,
    cleanup_interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if cleanup_interval_secs == 0 {
        return None;
    }
    let interval = Duration::from_secs(cleanup_interval_secs);

    Some(tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, CacheStore};
    use crate::upstream::{Payload, UpstreamResult};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    fn shared_cache() -> SharedCache {
        Arc::new(RwLock::new(CacheStore::new(100, Duration::from_secs(300))))
    }

    fn key(path: &str) -> CacheKey {
        CacheKey::new(path, std::iter::empty())
    }

    fn ok() -> UpstreamResult {
        UpstreamResult::success(200, Payload::Text("ok".into()))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = shared_cache();
        cache
            .write()
            .await
            .set(key("expire_soon"), ok(), Some(Duration::from_millis(100)));

        let handle = spawn_cleanup_task(cache.clone(), 1).unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        // lookups never remove entries, only the sweep does
        assert_eq!(cache.read().await.len(), 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = shared_cache();
        cache
            .write()
            .await
            .set(key("long_lived"), ok(), Some(Duration::from_secs(3600)));

        let handle = spawn_cleanup_task(cache.clone(), 1).unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.read().await.get(&key("long_lived")), Some(ok()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_disabled_with_zero_interval() {
        assert!(spawn_cleanup_task(shared_cache(), 0).is_none());
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(shared_cache(), 1).unwrap();

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
