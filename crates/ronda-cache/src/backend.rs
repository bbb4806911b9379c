//! Storage backend trait.

use async_trait::async_trait;

use crate::{CacheEntry, Result};

/// Storage behind a [`crate::ResultCache`].
///
/// Every backend honours the same contract: a missing or expired key reads
/// as `None`, expiry is re-checked at read time, and a write to an existing
/// key replaces it.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for stats and logs.
    fn name(&self) -> &'static str;

    /// Fetch a live entry.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or replace an entry.
    async fn put(&self, entry: CacheEntry) -> Result<()>;

    /// Remove a single key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;

    /// Drop expired entries, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64>;

    /// Number of stored entries, expired ones included until purged.
    async fn entry_count(&self) -> Result<u64>;
}
