//! SQLite backend.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::{CacheBackend, CacheEntry, CacheError, Result};

/// Schema for the persistent cache table. Times are unix milliseconds.
pub const CACHE_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS cache_entries (
    key         TEXT PRIMARY KEY NOT NULL,
    payload     TEXT NOT NULL,
    fetched_at  INTEGER NOT NULL,
    ttl_ms      INTEGER NOT NULL,
    expires_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at ON cache_entries (expires_at);
";

/// Persistent cache in a single SQLite table.
///
/// `rusqlite::Connection` is not `Sync`, so access is serialized behind a
/// `Mutex`. Statements are short point lookups and upserts.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the cache database at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or the database
    /// cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(CACHE_TABLE_DDL)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database with the schema applied.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CACHE_TABLE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CacheError::Unavailable(format!("SQLite mutex poisoned: {e}")))
    }
}

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

#[async_trait]
impl CacheBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let now = millis(Utc::now());
        let row = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare_cached(
                "SELECT payload, fetched_at, ttl_ms FROM cache_entries \
                 WHERE key = ?1 AND expires_at > ?2",
            )?;
            stmt.query_row(params![key, now], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .optional()?
        };

        let Some((payload, fetched_at, ttl_ms)) = row else {
            return Ok(None);
        };
        let fetched_at = DateTime::<Utc>::from_timestamp_millis(fetched_at).ok_or_else(|| {
            CacheError::Unavailable(format!("corrupt fetched_at for {key}: {fetched_at}"))
        })?;
        Ok(Some(CacheEntry {
            key: key.to_string(),
            payload: serde_json::from_str(&payload)?,
            fetched_at,
            ttl: Duration::from_millis(u64::try_from(ttl_ms).unwrap_or(0)),
        }))
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        let payload = serde_json::to_string(&entry.payload)?;
        let ttl_ms = i64::try_from(entry.ttl.as_millis()).unwrap_or(i64::MAX);
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (key, payload, fetched_at, ttl_ms, expires_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.key,
                payload,
                millis(entry.fetched_at),
                ttl_ms,
                millis(entry.expires_at()),
            ],
        )?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM cache_entries", [])?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = millis(Utc::now());
        let deleted = self
            .conn()?
            .execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![now])?;
        Ok(deleted as u64)
    }

    async fn entry_count(&self) -> Result<u64> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
