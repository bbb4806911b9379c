//! TTL result cache for provider payloads.
//!
//! [`ResultCache`] sits in front of a [`CacheBackend`]: an in-process moka
//! cache ([`MemoryBackend`]), a SQLite file ([`SqliteBackend`]), or both
//! ([`TieredBackend`]). Entries carry their own ttl and a read never returns
//! an entry older than it.

pub mod backend;
pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod tiered;

pub use backend::CacheBackend;
pub use cache::{CacheStats, ResultCache};
pub use config::{CacheBackendKind, CacheConfig};
pub use entry::{CacheEntry, CacheKey};
pub use error::{CacheError, Result};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use tiered::TieredBackend;
