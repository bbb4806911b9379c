//! In-memory backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use moka::Expiry;
use moka::future::Cache;

use crate::{CacheBackend, CacheEntry, Result};

/// Expires each moka entry after its own ttl.
struct EntryTtl;

impl Expiry<String, Arc<CacheEntry>> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Arc<CacheEntry>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.remaining_at(Utc::now()))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.remaining_at(Utc::now()))
    }
}

/// In-process cache backed by moka.
///
/// Entries carry their own ttl, so a 15 minute earnings payload and a 24 hour
/// profile share one bounded cache. Eviction beyond `max_capacity` is LRU-ish
/// (moka's TinyLFU).
pub struct MemoryBackend {
    inner: Cache<String, Arc<CacheEntry>>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl MemoryBackend {
    /// Create a cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
        }
    }

    pub(crate) async fn insert(&self, entry: CacheEntry) {
        self.inner.insert(entry.key.clone(), Arc::new(entry)).await;
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let Some(entry) = self.inner.get(key).await else {
            return Ok(None);
        };
        // moka's clock and ours can disagree by a tick; trust the entry.
        if entry.is_expired() {
            self.inner.invalidate(key).await;
            return Ok(None);
        }
        Ok(Some(entry.as_ref().clone()))
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        self.insert(entry).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let expired: Vec<Arc<String>> = self
            .inner
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key)
            .collect();
        for key in &expired {
            self.inner.invalidate(key.as_str()).await;
        }
        self.inner.run_pending_tasks().await;
        Ok(expired.len() as u64)
    }

    async fn entry_count(&self) -> Result<u64> {
        self.inner.run_pending_tasks().await;
        Ok(self.inner.entry_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheKey;
    use serde_json::json;

    fn entry(key: &str, ttl_secs: u64) -> CacheEntry {
        CacheEntry::new(&CacheKey::from_raw(key), json!({"k": key}), Duration::from_secs(ttl_secs))
    }

    #[tokio::test]
    async fn insert_and_get() {
        let cache = MemoryBackend::new(100);
        cache.put(entry("a", 60)).await.unwrap();

        let got = cache.get("a").await.unwrap().unwrap();
        assert_eq!(got.payload, json!({"k": "a"}));
        assert!(cache.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let cache = MemoryBackend::new(100);
        let mut stale = entry("a", 60);
        stale.fetched_at = Utc::now() - chrono::Duration::seconds(120);
        cache.put(stale).await.unwrap();

        assert!(cache.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ttl_expiration() {
        let cache = MemoryBackend::new(100);
        let short = CacheEntry::new(&CacheKey::from_raw("a"), json!(1), Duration::from_millis(50));
        cache.put(short).await.unwrap();
        assert!(cache.get("a").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = MemoryBackend::new(100);
        cache.put(entry("a", 60)).await.unwrap();
        let mut newer = entry("a", 60);
        newer.payload = json!("second");
        cache.put(newer).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap().unwrap().payload, json!("second"));
    }

    #[tokio::test]
    async fn remove_clear_and_purge() {
        let cache = MemoryBackend::new(100);
        cache.put(entry("a", 60)).await.unwrap();
        cache.put(entry("b", 60)).await.unwrap();
        cache.remove("a").await.unwrap();
        assert!(cache.get("a").await.unwrap().is_none());
        assert_eq!(cache.entry_count().await.unwrap(), 1);

        cache.clear().await.unwrap();
        assert_eq!(cache.entry_count().await.unwrap(), 0);

        let short = CacheEntry::new(&CacheKey::from_raw("c"), json!(1), Duration::from_millis(1));
        cache.put(short).await.unwrap();
        cache.put(entry("d", 60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.purge_expired().await.unwrap();
        assert!(cache.get("d").await.unwrap().is_some());
        assert!(cache.get("c").await.unwrap().is_none());
    }
}
