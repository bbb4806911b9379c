//! Error types for the FMP client.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the FMP API.
#[derive(Debug, Error)]
pub enum FmpError {
    /// Missing API key.
    #[error("FMP_API_KEY environment variable not set")]
    MissingApiKey,

    /// The provider answered 429.
    #[error("Rate limit exceeded on {endpoint}")]
    RateLimited {
        /// Endpoint path.
        endpoint: String,
        /// Provider-directed pause from the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The provider answered 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The credential was rejected (401/403 or an invalid key message).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Timeout, connection failure or 5xx; worth retrying.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The body was not the JSON shape we expected.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The provider reported an error in the body.
    #[error("FMP API error: {0}")]
    Api(String),

    /// A record lacks a field it cannot be scored without.
    #[error("{symbol}: missing required field {field}")]
    MissingField {
        /// Ticker symbol.
        symbol: String,
        /// Field name.
        field: &'static str,
    },

    /// No data available.
    #[error("No data available for {0}")]
    NoData(String),

    /// The run was cancelled.
    #[error("Cancelled")]
    Cancelled,

    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Environment variable error.
    #[error("Environment error: {0}")]
    Env(#[from] dotenvy::Error),
}

impl FmpError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient(_))
    }

    /// Whether the failure dooms every other request in the run too.
    #[must_use]
    pub const fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey | Self::Unauthorized(_) | Self::Cancelled
        )
    }
}
