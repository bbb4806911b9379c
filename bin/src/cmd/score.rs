//! Score command implementation.

use anyhow::{Context, Result};
use ronda::RondaConfig;

use crate::{cmd::cancel_on_ctrl_c, output::OutputFormat};

/// Score the given symbols without screening filters.
pub(crate) async fn run(
    config: RondaConfig,
    symbols: &[String],
    format: OutputFormat,
) -> Result<()> {
    let symbols: Vec<String> = symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    let client = config.build_client().context("failed to build API client")?;
    let screener = config.build_screener(client)?;
    cancel_on_ctrl_c(&screener);

    let report = screener
        .score_symbols(&symbols)
        .await
        .context("scoring failed")?;
    format.print(&report)
}
