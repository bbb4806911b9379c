//! Read-through memory over SQLite.

use async_trait::async_trait;
use tracing::debug;

use crate::{CacheBackend, CacheEntry, MemoryBackend, Result, SqliteBackend};

/// Checks moka first, then SQLite, promoting SQLite hits into memory.
///
/// Writes go to both tiers. A promoted entry keeps its original `fetched_at`,
/// so it expires from memory at the same moment it expires on disk.
#[derive(Debug)]
pub struct TieredBackend {
    memory: MemoryBackend,
    sqlite: SqliteBackend,
}

impl TieredBackend {
    /// Layer `memory` over `sqlite`.
    #[must_use]
    pub const fn new(memory: MemoryBackend, sqlite: SqliteBackend) -> Self {
        Self { memory, sqlite }
    }
}

#[async_trait]
impl CacheBackend for TieredBackend {
    fn name(&self) -> &'static str {
        "tiered"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        if let Some(entry) = self.memory.get(key).await? {
            return Ok(Some(entry));
        }
        let Some(entry) = self.sqlite.get(key).await? else {
            return Ok(None);
        };
        debug!(key, "promoting sqlite hit to memory");
        self.memory.insert(entry.clone()).await;
        Ok(Some(entry))
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        self.sqlite.put(entry.clone()).await?;
        self.memory.put(entry).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.memory.remove(key).await?;
        self.sqlite.remove(key).await
    }

    async fn clear(&self) -> Result<()> {
        self.memory.clear().await?;
        self.sqlite.clear().await
    }

    async fn purge_expired(&self) -> Result<u64> {
        self.memory.purge_expired().await?;
        self.sqlite.purge_expired().await
    }

    async fn entry_count(&self) -> Result<u64> {
        self.sqlite.entry_count().await
    }
}
