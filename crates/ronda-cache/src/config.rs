//! Cache configuration.

use serde::{Deserialize, Serialize};

use crate::{MemoryBackend, ResultCache, Result, SqliteBackend, TieredBackend};

/// Which backend a [`ResultCache`] is built on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// Process-local moka cache.
    Memory,
    /// SQLite file only.
    Sqlite,
    /// Memory over SQLite.
    #[default]
    Tiered,
}

/// Configuration for the result cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend selection.
    pub backend: CacheBackendKind,
    /// Path to the SQLite cache file, used by `sqlite` and `tiered`.
    pub sqlite_path: String,
    /// Maximum number of entries held in memory.
    pub memory_max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            sqlite_path: "data/ronda_cache.db".to_string(),
            memory_max_capacity: 10_000,
        }
    }
}

impl CacheConfig {
    /// Build the configured cache.
    ///
    /// # Errors
    ///
    /// Returns an error when the SQLite file cannot be opened.
    pub fn build(&self) -> Result<ResultCache> {
        Ok(match self.backend {
            CacheBackendKind::Memory => ResultCache::in_memory(self.memory_max_capacity),
            CacheBackendKind::Sqlite => ResultCache::new(SqliteBackend::open(&self.sqlite_path)?),
            CacheBackendKind::Tiered => ResultCache::new(TieredBackend::new(
                MemoryBackend::new(self.memory_max_capacity),
                SqliteBackend::open(&self.sqlite_path)?,
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_from_toml() {
        let config: CacheConfig = toml::from_str(
            r#"
backend = "memory"
memory_max_capacity = 50
"#,
        )
        .unwrap();
        assert_eq!(config.backend, CacheBackendKind::Memory);
        assert_eq!(config.memory_max_capacity, 50);
        assert_eq!(config.sqlite_path, CacheConfig::default().sqlite_path);
    }

    #[test]
    fn build_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db").to_string_lossy().into_owned();
        for (kind, name) in [
            (CacheBackendKind::Memory, "memory"),
            (CacheBackendKind::Sqlite, "sqlite"),
            (CacheBackendKind::Tiered, "tiered"),
        ] {
            let config = CacheConfig {
                backend: kind,
                sqlite_path: path.clone(),
                memory_max_capacity: 10,
            };
            assert_eq!(config.build().unwrap().backend_name(), name);
        }
    }
}
