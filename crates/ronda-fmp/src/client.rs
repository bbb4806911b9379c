//! FMP API client implementation.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use ronda_cache::{CacheKey, ResultCache};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, trace};

use crate::{
    Endpoint, FmpError, RateLimiter, Result, RetryPolicy, TtlPolicy,
    retry::retry,
    types::{
        BalanceSheet, CashFlowStatement, EarningsReport, FinancialRatios, IncomeStatement,
        InsiderTrade, KeyMetrics, Period, ProfilePayload, RatiosTtm, SentimentKind,
        SocialSentimentEntry, StockListEntry,
    },
};

/// Base URL for the FMP stable API.
pub const FMP_BASE_URL: &str = "https://financialmodelingprep.com/stable";

/// Connection and pacing settings for [`FmpClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, overridable for tests and proxies.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Requests allowed in flight at once.
    pub max_concurrent_requests: usize,
    /// Pause before each request, in milliseconds.
    pub request_delay_ms: u64,
    /// Requests allowed per rate window.
    pub rate_limit_requests: usize,
    /// Rate window length in seconds.
    pub rate_limit_window_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: FMP_BASE_URL.to_string(),
            timeout_secs: 30,
            max_concurrent_requests: 5,
            request_delay_ms: 60,
            rate_limit_requests: RateLimiter::DEFAULT_MAX_REQUESTS,
            rate_limit_window_secs: RateLimiter::DEFAULT_WINDOW.as_secs(),
        }
    }
}

type Params = Vec<(&'static str, String)>;

/// Financial Modeling Prep API client.
///
/// Every request passes through the result cache, then the shared rate
/// limiter, then a concurrency permit. Clones share all three.
#[derive(Debug, Clone)]
pub struct FmpClient {
    client: Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter>,
    permits: Arc<Semaphore>,
    cache: ResultCache,
    retry: RetryPolicy,
    ttl: TtlPolicy,
    request_delay: Duration,
}

impl FmpClient {
    /// Create a new FMP client with the given API key and default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, &ClientConfig::default())
    }

    /// Create a client with explicit connection settings.
    ///
    /// The cache defaults to a small in-memory one; swap it with [`Self::with_cache`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the HTTP client cannot be built.
    pub fn with_config(api_key: impl Into<String>, config: &ClientConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FmpError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_requests,
                Duration::from_secs(config.rate_limit_window_secs),
            )),
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            cache: ResultCache::in_memory(10_000),
            retry: RetryPolicy::default(),
            ttl: TtlPolicy::default(),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Create a new FMP client from the `FMP_API_KEY` environment variable.
    ///
    /// This will also load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment variable is not set or a `.env`
    /// file exists but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        load_dotenv()?;
        let api_key = env::var("FMP_API_KEY").map_err(|_| FmpError::MissingApiKey)?;
        Self::new(api_key)
    }

    /// Use `cache` for responses.
    #[must_use]
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = cache;
        self
    }

    /// Use `retry` for transient failures.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Use `ttl` for cache lifetimes.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    /// Share `limiter` with other clients.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// The result cache in use.
    #[must_use]
    pub const fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The rate limiter in use.
    #[must_use]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Build the URL for an endpoint path.
    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// Fetch raw JSON for `endpoint`, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the last attempt.
    pub async fn fetch(&self, endpoint: Endpoint, params: &[(&str, String)]) -> Result<Value> {
        let key = CacheKey::new(endpoint.path(), params);
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }

        let value = retry(&self.retry, endpoint.path(), |_| {
            self.request(endpoint, params)
        })
        .await?;

        self.cache
            .put(&key, value.clone(), self.ttl.ttl_for(endpoint))
            .await;
        Ok(value)
    }

    /// Make a GET request and parse the JSON response.
    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint, params: &Params) -> Result<T> {
        let value = self.fetch(endpoint, params).await?;
        serde_json::from_value(value).map_err(|e| FmpError::Malformed(format!("{endpoint}: {e}")))
    }

    /// One attempt: limiter grant, concurrency permit, pacing delay, GET.
    async fn request(&self, endpoint: Endpoint, params: &[(&str, String)]) -> Result<Value> {
        self.limiter.acquire().await;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FmpError::Cancelled)?;
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        trace!(endpoint = %endpoint, "GET");
        let response = self
            .client
            .get(self.url(endpoint))
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    FmpError::Http(e)
                } else {
                    FmpError::Transient(format!("{endpoint}: {e}"))
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            if let Some(pause) = retry_after {
                self.limiter.penalize(pause);
            }
            return Err(FmpError::RateLimited {
                endpoint: endpoint.path().to_string(),
                retry_after,
            });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FmpError::Unauthorized(format!("HTTP {status} on {endpoint}")));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(FmpError::NotFound(endpoint.path().to_string()));
        }
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            return Err(FmpError::Transient(format!("HTTP {status} on {endpoint}")));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FmpError::Api(format!("HTTP {status}: {text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FmpError::Transient(format!("{endpoint}: {e}")))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| FmpError::Malformed(format!("{endpoint}: {e}")))?;

        if let Some(message) = value.get("Error Message").and_then(Value::as_str) {
            if message.to_ascii_lowercase().contains("api key") {
                return Err(FmpError::Unauthorized(message.to_string()));
            }
            return Err(FmpError::Api(message.to_string()));
        }
        debug!(endpoint = %endpoint, status = status.as_u16(), "fetched");
        Ok(value)
    }

    /// Every listed symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn stock_list(&self) -> Result<Vec<StockListEntry>> {
        self.get(Endpoint::StockList, &Vec::new()).await
    }

    /// Profiles for a batch of symbols in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn profiles(&self, symbols: &[&str]) -> Result<Vec<ProfilePayload>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let joined = symbols
            .iter()
            .map(|s| s.to_uppercase())
            .collect::<Vec<_>>()
            .join(",");
        self.get(Endpoint::Profile, &vec![("symbol", joined)]).await
    }

    /// Get income statements for a symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Stock ticker symbol (e.g., "AAPL")
    /// * `period` - Annual or quarterly
    /// * `limit` - Number of periods to return (most recent first)
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn income_statement(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> Result<Vec<IncomeStatement>> {
        self.get(Endpoint::IncomeStatement, &statement_params(symbol, period, limit))
            .await
    }

    /// Get balance sheets for a symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn balance_sheet(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> Result<Vec<BalanceSheet>> {
        self.get(Endpoint::BalanceSheet, &statement_params(symbol, period, limit))
            .await
    }

    /// Get cash flow statements for a symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn cash_flow(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> Result<Vec<CashFlowStatement>> {
        self.get(Endpoint::CashFlow, &statement_params(symbol, period, limit))
            .await
    }

    /// Get financial ratios for a symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn ratios(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> Result<Vec<FinancialRatios>> {
        self.get(Endpoint::Ratios, &statement_params(symbol, period, limit))
            .await
    }

    /// Get trailing-twelve-month ratios for a symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn ratios_ttm(&self, symbol: &str) -> Result<Vec<RatiosTtm>> {
        self.get(Endpoint::RatiosTtm, &vec![("symbol", symbol.to_uppercase())])
            .await
    }

    /// Get key metrics for a symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn key_metrics(
        &self,
        symbol: &str,
        period: Period,
        limit: Option<u32>,
    ) -> Result<Vec<KeyMetrics>> {
        self.get(Endpoint::KeyMetrics, &statement_params(symbol, period, limit))
            .await
    }

    /// Most recent insider transactions for a symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn insider_trading(&self, symbol: &str, limit: u32) -> Result<Vec<InsiderTrade>> {
        let params = vec![
            ("symbol", symbol.to_uppercase()),
            ("page", "0".to_string()),
            ("limit", limit.to_string()),
        ];
        self.get(Endpoint::InsiderTrading, &params).await
    }

    /// Earnings reports for a symbol, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn earnings(&self, symbol: &str, limit: u32) -> Result<Vec<EarningsReport>> {
        let params = vec![
            ("symbol", symbol.to_uppercase()),
            ("limit", limit.to_string()),
        ];
        self.get(Endpoint::Earnings, &params).await
    }

    /// Stocktwits sentiment of one kind for a symbol.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn social_sentiment(
        &self,
        symbol: &str,
        kind: SentimentKind,
    ) -> Result<Vec<SocialSentimentEntry>> {
        let params = vec![
            ("symbol", symbol.to_uppercase()),
            ("type", kind.as_str().to_string()),
            ("source", "stocktwits".to_string()),
        ];
        self.get(Endpoint::SocialSentiment, &params).await
    }
}

fn statement_params(symbol: &str, period: Period, limit: Option<u32>) -> Params {
    let mut params = vec![
        ("symbol", symbol.to_uppercase()),
        ("period", period.as_str().to_string()),
    ];
    if let Some(limit) = limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

/// Load `.env` from the working directory or a parent, if there is one.
///
/// # Errors
///
/// [`FmpError::Env`] when a `.env` file exists but cannot be read or parsed.
pub fn load_dotenv() -> Result<()> {
    tolerate_missing(dotenvy::dotenv())
}

fn tolerate_missing<T>(loaded: dotenvy::Result<T>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(FmpError::Env(e)),
    }
}
