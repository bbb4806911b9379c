//! The result cache facade used by the network client.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{CacheBackend, CacheEntry, CacheKey, MemoryBackend, Result};

/// Snapshot of cache state for maintenance commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Backend name (`memory`, `sqlite`, `tiered`).
    pub backend: &'static str,
    /// Stored entries, including expired rows not yet purged.
    pub entries: u64,
}

/// TTL cache of provider payloads.
///
/// Cheap to clone; clones share the backend. Reads never fail: a backend
/// error is logged and reported as a miss so a broken cache degrades to
/// "always fetch" instead of failing a screening run.
#[derive(Clone)]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ResultCache {
    /// Wrap a backend.
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wrap a shared backend.
    #[must_use]
    pub fn from_shared(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// In-memory cache with the given capacity.
    #[must_use]
    pub fn in_memory(max_capacity: u64) -> Self {
        Self::new(MemoryBackend::new(max_capacity))
    }

    /// Backend name.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Live payload for `key`, or `None` on miss, expiry, or backend failure.
    pub async fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        match self.backend.get(key.as_str()).await {
            Ok(Some(entry)) if !entry.is_expired() => {
                debug!(key = %key, "cache hit");
                Some(entry.payload)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(key = %key, backend = self.backend.name(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store `payload` under `key` for `ttl`. A zero ttl stores nothing.
    ///
    /// Write failures are logged; the caller already holds the payload.
    pub async fn put(&self, key: &CacheKey, payload: serde_json::Value, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        if let Err(e) = self.backend.put(CacheEntry::new(key, payload, ttl)).await {
            warn!(key = %key, backend = self.backend.name(), error = %e, "cache write failed");
        }
    }

    /// Remove one key.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn remove(&self, key: &CacheKey) -> Result<()> {
        self.backend.remove(key.as_str()).await
    }

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }

    /// Drop expired entries and return how many were removed.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn purge_expired(&self) -> Result<u64> {
        let purged = self.backend.purge_expired().await?;
        debug!(backend = self.backend.name(), purged, "purged expired cache entries");
        Ok(purged)
    }

    /// Entry count and backend name.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn stats(&self) -> Result<CacheStats> {
        Ok(CacheStats {
            backend: self.backend.name(),
            entries: self.backend.entry_count().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CacheError, SqliteBackend, TieredBackend};
    use async_trait::async_trait;
    use serde_json::json;

    /// Backend whose every call fails.
    struct Broken;

    #[async_trait]
    impl CacheBackend for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        async fn get(&self, _key: &str) -> Result<Option<CacheEntry>> {
            Err(CacheError::Unavailable("down".to_string()))
        }
        async fn put(&self, _entry: CacheEntry) -> Result<()> {
            Err(CacheError::Unavailable("down".to_string()))
        }
        async fn remove(&self, _key: &str) -> Result<()> {
            Err(CacheError::Unavailable("down".to_string()))
        }
        async fn clear(&self) -> Result<()> {
            Err(CacheError::Unavailable("down".to_string()))
        }
        async fn purge_expired(&self) -> Result<u64> {
            Err(CacheError::Unavailable("down".to_string()))
        }
        async fn entry_count(&self) -> Result<u64> {
            Err(CacheError::Unavailable("down".to_string()))
        }
    }

    fn backends() -> Vec<ResultCache> {
        vec![
            ResultCache::in_memory(100),
            ResultCache::new(SqliteBackend::open_in_memory().unwrap()),
            ResultCache::new(TieredBackend::new(
                MemoryBackend::new(100),
                SqliteBackend::open_in_memory().unwrap(),
            )),
        ]
    }

    #[tokio::test]
    async fn round_trip_every_backend() {
        let key = CacheKey::new("profile", &[("symbol", "AAPL")]);
        for cache in backends() {
            assert!(cache.get(&key).await.is_none(), "{}", cache.backend_name());
            cache.put(&key, json!([{"symbol": "AAPL"}]), Duration::from_secs(60)).await;
            assert_eq!(
                cache.get(&key).await,
                Some(json!([{"symbol": "AAPL"}])),
                "{}",
                cache.backend_name()
            );
            assert_eq!(cache.stats().await.unwrap().entries, 1);
        }
    }

    #[tokio::test]
    async fn ttl_expiry_every_backend() {
        let key = CacheKey::new("earnings", &[("symbol", "AAPL")]);
        let caches = backends();
        for cache in &caches {
            cache.put(&key, json!(1), Duration::from_millis(30)).await;
            assert!(cache.get(&key).await.is_some(), "{}", cache.backend_name());
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        for cache in &caches {
            assert!(cache.get(&key).await.is_none(), "{}", cache.backend_name());
        }
    }

    #[tokio::test]
    async fn zero_ttl_is_not_stored() {
        let cache = ResultCache::in_memory(10);
        let key = CacheKey::from_raw("k");
        cache.put(&key, json!(1), Duration::ZERO).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn backend_failure_reads_as_miss() {
        let cache = ResultCache::new(Broken);
        let key = CacheKey::from_raw("k");
        cache.put(&key, json!(1), Duration::from_secs(60)).await;
        assert!(cache.get(&key).await.is_none());
        assert!(cache.stats().await.is_err());
        assert!(cache.clear().await.is_err());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let cache = ResultCache::in_memory(10);
        let other = cache.clone();
        let key = CacheKey::from_raw("k");
        cache.put(&key, json!("v"), Duration::from_secs(60)).await;
        assert_eq!(other.get(&key).await, Some(json!("v")));
        other.remove(&key).await.unwrap();
        assert!(cache.get(&key).await.is_none());
    }
}
