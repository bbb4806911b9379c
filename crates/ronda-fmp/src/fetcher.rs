//! Per-entity data fetching on top of [`FmpClient`].

use std::future::Future;

use futures::future::join_all;
use ronda_traits::{CompanyProfile, FinancialRecord, Series};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    FmpClient, FmpError, Result,
    assemble::{RawFundamentals, assemble_record},
    types::{FinancialRatios, Period, SentimentKind},
};

/// What and how much to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Exchange the universe is drawn from.
    pub exchange: String,
    /// Fiscal years of history per record.
    pub history_years: u32,
    /// Symbols per profile request.
    pub profile_batch_size: usize,
    /// Insider transactions per record.
    pub insider_limit: u32,
    /// Earnings reports per record.
    pub earnings_limit: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            exchange: "NASDAQ".to_string(),
            history_years: 5,
            profile_batch_size: 100,
            insider_limit: 100,
            earnings_limit: 4,
        }
    }
}

/// Fetches universes, ROE histories and complete records.
///
/// Every call observes the fetcher's cancellation token.
#[derive(Debug, Clone)]
pub struct DataFetcher {
    client: FmpClient,
    config: FetchConfig,
    cancel: CancellationToken,
}

impl DataFetcher {
    /// Create a fetcher with its own cancellation token.
    #[must_use]
    pub fn new(client: FmpClient, config: FetchConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Observe `cancel` instead of the fetcher's own token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &FmpClient {
        &self.client
    }

    /// Fetch settings.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The token this fetcher observes.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    async fn cancellable<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(FmpError::Cancelled),
            result = fut => result,
        }
    }

    /// Profiles for every equity listed on the configured exchange, sorted by symbol.
    ///
    /// # Errors
    ///
    /// Fails when the stock list cannot be fetched, when every profile batch
    /// fails, or on a run-fatal error from any batch.
    pub async fn fetch_universe(&self) -> Result<Vec<CompanyProfile>> {
        self.cancellable(self.universe()).await
    }

    async fn universe(&self) -> Result<Vec<CompanyProfile>> {
        let listed = self.client.stock_list().await?;
        let symbols: Vec<String> = listed
            .into_iter()
            .filter(|e| e.is_equity_on(&self.config.exchange))
            .map(|e| e.symbol)
            .collect();
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let batches: Vec<Vec<&str>> = symbols
            .chunks(self.config.profile_batch_size.max(1))
            .map(|chunk| chunk.iter().map(String::as_str).collect())
            .collect();
        let batch_count = batches.len();
        let results = join_all(batches.iter().map(|batch| self.client.profiles(batch))).await;

        let mut profiles = Vec::with_capacity(symbols.len());
        let mut first_error = None;
        let mut failed = 0;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(batch) => profiles.extend(batch.into_iter().map(CompanyProfile::from)),
                Err(e) if e.is_fatal_for_run() => return Err(e),
                Err(e) => {
                    warn!(stage = "universe", batch = index, error = %e, "profile batch failed");
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error.filter(|_| failed == batch_count) {
            return Err(e);
        }

        profiles.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        profiles.dedup_by(|a, b| a.symbol == b.symbol);
        info!(
            exchange = %self.config.exchange,
            listed = symbols.len(),
            profiles = profiles.len(),
            failed_batches = failed,
            "universe fetched"
        );
        Ok(profiles)
    }

    /// Annual ROE history, oldest first.
    ///
    /// Issues the same ratios request as [`Self::fetch_record`], so a later
    /// full fetch reads it from cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the run is cancelled.
    pub async fn fetch_roe_history(&self, symbol: &str) -> Result<Series> {
        let mut ratios = self
            .cancellable(self.client.ratios(
                symbol,
                Period::Annual,
                Some(self.config.history_years),
            ))
            .await?;
        ratios.retain(|r| r.year().is_some());
        ratios.sort_by_key(FinancialRatios::year);
        ratios.dedup_by_key(|r| r.year());
        Ok(Series::new(ratios.iter().map(|r| r.return_on_equity).collect()))
    }

    /// Fetch everything needed to score `profile`.
    ///
    /// # Errors
    ///
    /// Fails when a statement call fails, when price or market cap is
    /// missing, on a run-fatal error from any call, or on cancellation.
    pub async fn fetch_record(&self, profile: &CompanyProfile) -> Result<FinancialRecord> {
        let raw = self.cancellable(self.raw_fundamentals(&profile.symbol)).await?;
        assemble_record(profile.clone(), &raw, self.config.history_years as usize)
    }

    /// Fetch the profile for `symbol`, then its full record.
    ///
    /// # Errors
    ///
    /// [`FmpError::NotFound`] when the provider has no profile, otherwise as
    /// [`Self::fetch_record`].
    pub async fn fetch_record_by_symbol(&self, symbol: &str) -> Result<FinancialRecord> {
        let profiles = self.cancellable(self.client.profiles(&[symbol])).await?;
        let profile = profiles
            .into_iter()
            .find(|p| p.symbol.eq_ignore_ascii_case(symbol))
            .map(CompanyProfile::from)
            .ok_or_else(|| FmpError::NotFound(symbol.to_uppercase()))?;
        self.fetch_record(&profile).await
    }

    async fn raw_fundamentals(&self, symbol: &str) -> Result<RawFundamentals> {
        let years = Some(self.config.history_years);
        let client = &self.client;
        let (income, balance, cash_flow, ratios, ratios_ttm, metrics, insider, earnings, bull, bear) = tokio::join!(
            client.income_statement(symbol, Period::Annual, years),
            client.balance_sheet(symbol, Period::Annual, years),
            client.cash_flow(symbol, Period::Annual, years),
            client.ratios(symbol, Period::Annual, years),
            client.ratios_ttm(symbol),
            client.key_metrics(symbol, Period::Annual, years),
            client.insider_trading(symbol, self.config.insider_limit),
            client.earnings(symbol, self.config.earnings_limit),
            client.social_sentiment(symbol, SentimentKind::Bullish),
            client.social_sentiment(symbol, SentimentKind::Bearish),
        );

        Ok(RawFundamentals {
            income: income?,
            balance: balance?,
            cash_flow: cash_flow?,
            ratios: optional(symbol, "ratios", ratios)?.unwrap_or_default(),
            ratios_ttm: optional(symbol, "ratios-ttm", ratios_ttm)?
                .and_then(|rows| rows.into_iter().next()),
            key_metrics: optional(symbol, "key-metrics", metrics)?.unwrap_or_default(),
            insider: optional(symbol, "insider-trading", insider)?,
            earnings: optional(symbol, "earnings", earnings)?,
            bullish: optional(symbol, "social-sentiment", bull)?,
            bearish: optional(symbol, "social-sentiment", bear)?,
        })
    }
}

/// Degrade a failed optional call to `None`, unless the failure dooms the run.
fn optional<T>(symbol: &str, source: &'static str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal_for_run() => Err(e),
        Err(e) => {
            debug!(symbol, source, error = %e, "optional data unavailable");
            Ok(None)
        }
    }
}
