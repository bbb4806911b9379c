//! Screen command implementation.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ronda::{RondaConfig, ScreeningCriteria};
use tracing::info;

use crate::{cmd::cancel_on_ctrl_c, output::OutputFormat};

/// Screening criteria from flags, optionally layered over a JSON file.
#[derive(Args, Debug, Default)]
pub(crate) struct CriteriaArgs {
    /// JSON criteria file (`minMarketCap`, `maxPE`, `minROE`, ...)
    #[arg(long)]
    criteria: Option<PathBuf>,

    /// Minimum market capitalization
    #[arg(long)]
    min_market_cap: Option<f64>,

    /// Maximum market capitalization
    #[arg(long)]
    max_market_cap: Option<f64>,

    /// Maximum trailing P/E
    #[arg(long)]
    max_pe: Option<f64>,

    /// Minimum ROE every year, in percent
    #[arg(long)]
    min_roe: Option<f64>,

    /// Minimum revenue CAGR, in percent
    #[arg(long)]
    min_revenue_growth: Option<f64>,

    /// Minimum composite quality score (0 to 1)
    #[arg(long)]
    min_quality: Option<f64>,

    /// Sectors to include
    #[arg(long, value_delimiter = ',')]
    sectors: Vec<String>,

    /// Sectors to exclude
    #[arg(long, value_delimiter = ',')]
    exclude_sectors: Vec<String>,
}

impl CriteriaArgs {
    /// Read the criteria file, if any, and apply flag overrides on top.
    pub(crate) fn resolve(self) -> Result<ScreeningCriteria> {
        let base = match &self.criteria {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read criteria: {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse criteria: {}", path.display()))?
            }
            None => ScreeningCriteria::default(),
        };
        Ok(self.apply(base))
    }

    fn apply(self, base: ScreeningCriteria) -> ScreeningCriteria {
        let mut criteria = base;
        criteria.min_market_cap = self.min_market_cap.or(criteria.min_market_cap);
        criteria.max_market_cap = self.max_market_cap.or(criteria.max_market_cap);
        criteria.max_pe = self.max_pe.or(criteria.max_pe);
        criteria.min_roe = self.min_roe.or(criteria.min_roe);
        criteria.min_revenue_growth = self.min_revenue_growth.or(criteria.min_revenue_growth);
        criteria.min_quality_score = self.min_quality.or(criteria.min_quality_score);
        if !self.sectors.is_empty() {
            criteria.sectors = self.sectors;
        }
        if !self.exclude_sectors.is_empty() {
            criteria.exclude_sectors = self.exclude_sectors;
        }
        criteria
    }
}

/// Run one screening and print the ranked results.
pub(crate) async fn run(
    mut config: RondaConfig,
    args: CriteriaArgs,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let criteria = args.resolve()?;
    criteria.validate().context("invalid screening criteria")?;
    if limit.is_some() {
        config.screen.max_results = limit;
    }

    let client = config.build_client().context("failed to build API client")?;
    let screener = config.build_screener(client)?;
    cancel_on_ctrl_c(&screener);

    info!(exchange = %config.fetch.exchange, "starting screening");
    let report = screener.screen(&criteria).await.context("screening failed")?;
    format.print(&report)
}
