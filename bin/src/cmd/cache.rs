//! Cache command implementation.

use anyhow::{Context, Result};
use ronda::RondaConfig;

use crate::CacheAction;

/// Inspect or maintain the configured result cache.
pub(crate) async fn run(config: &RondaConfig, action: CacheAction) -> Result<()> {
    let cache = config
        .build_cache()
        .with_context(|| format!("failed to open {} cache", config.cache.sqlite_path))?;

    match action {
        CacheAction::Stats => {
            let stats = cache.stats().await.context("failed to read cache stats")?;
            println!("Backend: {}", stats.backend);
            println!("Entries: {}", stats.entries);
        }
        CacheAction::Purge => {
            let removed = cache.purge_expired().await.context("failed to purge cache")?;
            println!("Removed {removed} expired entries");
        }
        CacheAction::Clear => {
            cache.clear().await.context("failed to clear cache")?;
            println!("Cache cleared");
        }
    }
    Ok(())
}
