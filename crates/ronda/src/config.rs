//! TOML configuration and the wiring built from it.
//!
//! Every section has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! [api]
//! base_url = "https://financialmodelingprep.com/stable"
//!
//! [client]
//! max_concurrent_requests = 5
//! request_delay_ms = 60
//!
//! [cache]
//! backend = "tiered"
//! sqlite_path = "data/ronda_cache.db"
//!
//! [screen]
//! entity_concurrency = 8
//! max_results = 50
//!
//! [scoring.weights]
//! growth = 0.40
//! risk = 0.25
//! valuation = 0.20
//! sentiment = 0.15
//! ```

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use ronda_cache::{CacheConfig, CacheError, ResultCache};
use ronda_combine::{QualityScorer, ScoringConfig};
use ronda_fmp::{
    ClientConfig, DataFetcher, FMP_BASE_URL, FetchConfig, FmpClient, FmpError, RetryPolicy,
    TtlPolicy,
};
use ronda_screen::{JobRegistry, ScreenConfig, Screener};
use ronda_traits::RondaError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "FMP_API_KEY";

/// Errors from loading configuration or building components from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for [`RondaConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No API key in the environment, `.env` or `[api]`.
    #[error("no API key: set FMP_API_KEY or [api].api_key")]
    MissingApiKey,

    /// The cache backend could not be opened.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The API client could not be built.
    #[error(transparent)]
    Client(#[from] FmpError),

    /// Scoring weights or thresholds are invalid.
    #[error(transparent)]
    Scoring(#[from] RondaError),
}

/// `[api]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API root.
    pub base_url: String,
    /// Key used when `FMP_API_KEY` is not set.
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: FMP_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

/// `[client]` section: pacing and concurrency of outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Requests allowed in flight at once.
    pub max_concurrent_requests: usize,
    /// Pause before each request, in milliseconds.
    pub request_delay_ms: u64,
    /// Requests allowed per rate window.
    pub rate_limit_requests: usize,
    /// Rate window length in seconds.
    pub rate_limit_window_secs: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        let defaults = ClientConfig::default();
        Self {
            max_concurrent_requests: defaults.max_concurrent_requests,
            request_delay_ms: defaults.request_delay_ms,
            rate_limit_requests: defaults.rate_limit_requests,
            rate_limit_window_secs: defaults.rate_limit_window_secs,
            timeout_secs: defaults.timeout_secs,
        }
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RondaConfig {
    /// API location and key.
    pub api: ApiConfig,
    /// Request pacing.
    pub client: ClientSection,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Result cache backend.
    pub cache: CacheConfig,
    /// Cache lifetimes per endpoint kind.
    pub ttl: TtlPolicy,
    /// Universe and history settings.
    pub fetch: FetchConfig,
    /// Orchestrator settings.
    pub screen: ScreenConfig,
    /// Scorer weights, thresholds and sector benchmarks.
    pub scoring: ScoringConfig,
}

impl RondaConfig {
    /// Load `path`, falling back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_toml(&text)?;
                info!(path = %path.display(), "configuration loaded");
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or mistyped values.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The API key: `FMP_API_KEY` (environment or `.env`) wins over `[api].api_key`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingApiKey`] when neither source has a non-empty key,
    /// [`ConfigError::Client`] when a `.env` file exists but cannot be parsed.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        ronda_fmp::load_dotenv()?;
        choose_api_key(env::var(API_KEY_ENV).ok(), self.api.api_key.as_deref())
    }

    /// Connection settings for [`FmpClient`].
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout_secs: self.client.timeout_secs,
            max_concurrent_requests: self.client.max_concurrent_requests,
            request_delay_ms: self.client.request_delay_ms,
            rate_limit_requests: self.client.rate_limit_requests,
            rate_limit_window_secs: self.client.rate_limit_window_secs,
        }
    }

    /// Open the configured cache.
    ///
    /// # Errors
    ///
    /// Fails when the SQLite file cannot be opened.
    pub fn build_cache(&self) -> Result<ResultCache, ConfigError> {
        Ok(self.cache.build()?)
    }

    /// Build a client with `api_key`, this file's pacing, retry, ttl and `cache`.
    ///
    /// # Errors
    ///
    /// Fails on an empty key or when the HTTP client cannot be built.
    pub fn build_client_with(
        &self,
        api_key: &str,
        cache: ResultCache,
    ) -> Result<FmpClient, ConfigError> {
        let client = FmpClient::with_config(api_key, &self.client_config())?
            .with_retry(self.retry)
            .with_ttl(self.ttl)
            .with_cache(cache);
        info!(
            base_url = %self.api.base_url,
            cache = client.cache().backend_name(),
            max_concurrent = self.client.max_concurrent_requests,
            delay = ?Duration::from_millis(self.client.request_delay_ms),
            "client ready"
        );
        Ok(client)
    }

    /// Build a client from the resolved API key and the configured cache.
    ///
    /// # Errors
    ///
    /// Fails without an API key, when the cache cannot be opened, or when the
    /// HTTP client cannot be built.
    pub fn build_client(&self) -> Result<FmpClient, ConfigError> {
        let key = self.api_key()?;
        self.build_client_with(&key, self.build_cache()?)
    }

    /// Build the quality scorer.
    ///
    /// # Errors
    ///
    /// Fails when weights or coherence bounds are invalid.
    pub fn build_scorer(&self) -> Result<QualityScorer, ConfigError> {
        Ok(QualityScorer::new(&self.scoring)?)
    }

    /// Build a screener over `client`.
    ///
    /// # Errors
    ///
    /// Fails when the scoring configuration is invalid.
    pub fn build_screener(&self, client: FmpClient) -> Result<Screener, ConfigError> {
        Ok(Screener::new(
            DataFetcher::new(client, self.fetch.clone()),
            Arc::new(self.build_scorer()?),
            self.screen.clone(),
        ))
    }

    /// Build a job registry over `client`.
    ///
    /// # Errors
    ///
    /// Fails when the scoring configuration is invalid.
    pub fn build_registry(&self, client: FmpClient) -> Result<JobRegistry, ConfigError> {
        Ok(JobRegistry::new(
            DataFetcher::new(client, self.fetch.clone()),
            Arc::new(self.build_scorer()?),
            self.screen.clone(),
        ))
    }
}

fn choose_api_key(
    from_env: Option<String>,
    from_file: Option<&str>,
) -> Result<String, ConfigError> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            from_file
                .filter(|k| !k.trim().is_empty())
                .map(str::to_string)
        })
        .ok_or(ConfigError::MissingApiKey)
}
