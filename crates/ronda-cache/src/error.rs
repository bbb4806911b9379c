//! Cache error types.

use thiserror::Error;

/// Errors raised by cache backends.
///
/// Reads through [`crate::ResultCache`] never surface these; they are logged
/// and treated as a miss. Maintenance operations return them.
#[derive(Debug, Error)]
pub enum CacheError {
    /// SQLite failure.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Payload (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure while preparing the cache location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend cannot be used (poisoned lock, bad configuration).
    #[error("Cache not available: {0}")]
    Unavailable(String),
}

/// Result alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
