//! Screening orchestrator.

use std::{sync::Arc, time::Instant};

use futures::{StreamExt, stream};
use ronda_combine::{QualityScorer, ScoredEntity, assign_sector_percentiles, rank};
use ronda_fmp::{DataFetcher, FmpError};
use ronda_traits::{CompanyProfile, ScreeningCriteria};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    CoarseFilter, FailureStage, Result, RoeConfig, RoeFilter, ScreenError, ScreenProgress,
    ScreenStage, ScreeningReport,
};

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Entity pipelines in flight at once (default: 8)
    pub entity_concurrency: usize,
    /// Historical ROE thresholds.
    pub roe: RoeConfig,
    /// Cap on ranked results (default: 50)
    pub max_results: Option<usize>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            entity_concurrency: 8,
            roe: RoeConfig::default(),
            max_results: Some(50),
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Record a per-entity failure, or escalate one that dooms the run.
fn record_failure(
    report: &mut ScreeningReport,
    symbol: &str,
    stage: FailureStage,
    error: FmpError,
) -> Result<()> {
    let error = match ScreenError::escalate(error) {
        Ok(fatal) => return Err(fatal),
        Err(error) => error,
    };
    warn!(symbol, stage = ?stage, error = %error, "entity dropped");
    report.fail(symbol, stage, error.to_string());
    Ok(())
}

/// Runs criteria through filtering, fetching, scoring and ranking.
///
/// Every run observes a child of the screener's cancellation token, and its
/// progress is published on a [`watch`] channel:
///
/// ```text
/// Idle -> Filtering -> Fetching -> Scoring -> Ranked
///                                          \-> Failed
/// ```
#[derive(Debug)]
pub struct Screener {
    fetcher: DataFetcher,
    scorer: Arc<QualityScorer>,
    config: ScreenConfig,
    cancel: CancellationToken,
    progress: watch::Sender<ScreenProgress>,
}

impl Screener {
    /// Create a screener.
    #[must_use]
    pub fn new(fetcher: DataFetcher, scorer: Arc<QualityScorer>, config: ScreenConfig) -> Self {
        let (progress, _) = watch::channel(ScreenProgress::default());
        Self {
            fetcher,
            scorer,
            config,
            cancel: CancellationToken::new(),
            progress,
        }
    }

    /// Derive run tokens from `cancel`.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token whose cancellation stops every run of this screener.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// Watch run progress.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScreenProgress> {
        self.progress.subscribe()
    }

    fn publish(&self, progress: ScreenProgress) {
        self.progress.send_replace(progress);
    }

    fn advance(&self) {
        self.progress.send_modify(|p| p.completed += 1);
    }

    fn concurrency(&self) -> usize {
        self.config.entity_concurrency.max(1)
    }

    /// Screen the configured universe against `criteria`.
    ///
    /// Zero survivors is a successful, empty result.
    ///
    /// # Errors
    ///
    /// Invalid criteria, a failed or empty universe, a rejected credential,
    /// or cancellation. Per-entity failures are recorded in the report.
    pub async fn screen(&self, criteria: &ScreeningCriteria) -> Result<ScreeningReport> {
        let result = self.run(criteria).await;
        if let Err(e) = &result {
            warn!(stage = "screen", error = %e, "screening failed");
            self.publish(ScreenProgress::at(ScreenStage::Failed, 0));
        }
        result
    }

    async fn run(&self, criteria: &ScreeningCriteria) -> Result<ScreeningReport> {
        criteria.validate()?;
        let started = Instant::now();
        let mut report = ScreeningReport::new(criteria.clone());
        let fetcher = self.run_fetcher();

        self.publish(ScreenProgress::at(ScreenStage::Filtering, 0));
        let universe = fetcher
            .fetch_universe()
            .await
            .map_err(|e| ScreenError::escalate(e).unwrap_or_else(ScreenError::Universe))?;
        if universe.is_empty() {
            return Err(ScreenError::EmptyUniverse);
        }
        report.universe_size = universe.len();

        let coarse = CoarseFilter::new(criteria);
        let mut candidates = Vec::new();
        for profile in universe {
            match coarse.check(&profile) {
                Ok(()) => candidates.push(profile),
                Err(reason) => {
                    debug!(symbol = %profile.symbol, stage = "profile", %reason, "filtered out");
                    report.reject(reason.label());
                }
            }
        }
        report.profile_passed = candidates.len();

        let survivors = self
            .roe_pass(&fetcher, criteria, candidates, &mut report)
            .await?;
        report.roe_passed = survivors.len();
        report.timings.filtering_ms = elapsed_ms(started);
        info!(
            universe = report.universe_size,
            profile_passed = report.profile_passed,
            roe_passed = report.roe_passed,
            "filtering complete"
        );

        let fetch_started = Instant::now();
        let scored = self
            .score_pipeline(&fetcher, survivors, Some(&coarse), &mut report)
            .await?;
        report.timings.fetching_ms = elapsed_ms(fetch_started);

        self.finish(report, scored, criteria.min_quality_score, started)
    }

    /// Score specific symbols, bypassing the universe and both filter passes.
    ///
    /// # Errors
    ///
    /// A rejected credential or cancellation. Unknown symbols are recorded
    /// as failures.
    pub async fn score_symbols(&self, symbols: &[String]) -> Result<ScreeningReport> {
        let result = self.run_symbols(symbols).await;
        if let Err(e) = &result {
            warn!(stage = "score", error = %e, "scoring failed");
            self.publish(ScreenProgress::at(ScreenStage::Failed, 0));
        }
        result
    }

    async fn run_symbols(&self, symbols: &[String]) -> Result<ScreeningReport> {
        let started = Instant::now();
        let mut report = ScreeningReport::new(ScreeningCriteria::default());
        report.universe_size = symbols.len();
        report.profile_passed = symbols.len();
        report.roe_passed = symbols.len();
        let fetcher = self.run_fetcher();

        self.publish(ScreenProgress::at(ScreenStage::Fetching, symbols.len()));
        let mut pipelines = stream::iter(symbols.iter().cloned())
            .map(|symbol| {
                let fetcher = &fetcher;
                async move {
                    let record = fetcher.fetch_record_by_symbol(&symbol).await;
                    (symbol, record)
                }
            })
            .buffer_unordered(self.concurrency());

        let mut scored = Vec::new();
        while let Some((symbol, record)) = pipelines.next().await {
            self.advance();
            match record {
                Ok(record) => scored.push(self.scorer.score_entity(&record)),
                Err(e) => record_failure(&mut report, &symbol, FailureStage::Fetch, e)?,
            }
        }
        drop(pipelines);
        report.timings.fetching_ms = elapsed_ms(started);

        self.finish(report, scored, None, started)
    }

    fn run_fetcher(&self) -> DataFetcher {
        self.fetcher
            .clone()
            .with_cancellation(self.cancel.child_token())
    }

    async fn roe_pass(
        &self,
        fetcher: &DataFetcher,
        criteria: &ScreeningCriteria,
        candidates: Vec<CompanyProfile>,
        report: &mut ScreeningReport,
    ) -> Result<Vec<CompanyProfile>> {
        let filter = RoeFilter::new(self.config.roe, criteria.min_roe_fraction());
        self.publish(ScreenProgress::at(ScreenStage::Filtering, candidates.len()));

        let mut checks = stream::iter(candidates)
            .map(|profile| async move {
                let history = fetcher.fetch_roe_history(&profile.symbol).await;
                (profile, history)
            })
            .buffer_unordered(self.concurrency());

        let mut survivors = Vec::new();
        while let Some((profile, history)) = checks.next().await {
            self.advance();
            match history {
                Ok(roe) => match filter.check(&roe) {
                    Ok(()) => survivors.push(profile),
                    Err(reason) => {
                        debug!(symbol = %profile.symbol, stage = "roe", %reason, "filtered out");
                        report.reject(reason.label());
                    }
                },
                Err(e) => {
                    record_failure(report, &profile.symbol, FailureStage::RoeHistory, e)?;
                }
            }
        }
        survivors.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(survivors)
    }

    async fn score_pipeline(
        &self,
        fetcher: &DataFetcher,
        survivors: Vec<CompanyProfile>,
        coarse: Option<&CoarseFilter<'_>>,
        report: &mut ScreeningReport,
    ) -> Result<Vec<ScoredEntity>> {
        self.publish(ScreenProgress::at(ScreenStage::Fetching, survivors.len()));
        let scorer = &self.scorer;
        let mut pipelines = stream::iter(survivors)
            .map(|profile| async move {
                let scored = fetcher
                    .fetch_record(&profile)
                    .await
                    .map(|record| scorer.score_entity(&record));
                (profile.symbol, scored)
            })
            .buffer_unordered(self.concurrency());

        let mut scored = Vec::new();
        while let Some((symbol, result)) = pipelines.next().await {
            self.advance();
            match result {
                Ok(entity) => match coarse.map_or(Ok(()), |c| c.check_scored(&entity)) {
                    Ok(()) => scored.push(entity),
                    Err(reason) => {
                        debug!(symbol, stage = "record", %reason, "filtered out");
                        report.reject(reason.label());
                    }
                },
                Err(e) => record_failure(report, &symbol, FailureStage::Fetch, e)?,
            }
        }
        Ok(scored)
    }

    fn finish(
        &self,
        mut report: ScreeningReport,
        mut scored: Vec<ScoredEntity>,
        min_quality: Option<f64>,
        started: Instant,
    ) -> Result<ScreeningReport> {
        if self.cancel.is_cancelled() {
            return Err(ScreenError::Cancelled);
        }
        let ranking_started = Instant::now();
        self.publish(ScreenProgress::at(ScreenStage::Scoring, scored.len()));
        report.scored = scored.len();
        assign_sector_percentiles(&mut scored);
        report.results = rank(scored, min_quality, self.config.max_results);
        report.timings.ranking_ms = elapsed_ms(ranking_started);
        report.timings.total_ms = elapsed_ms(started);

        report.failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        self.publish(ScreenProgress::at(ScreenStage::Ranked, report.results.len()));
        info!(
            scored = report.scored,
            ranked = report.results.len(),
            failures = report.failures.len(),
            total_ms = report.timings.total_ms,
            "screening complete"
        );
        Ok(report)
    }
}
