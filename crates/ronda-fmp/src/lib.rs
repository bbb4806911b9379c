//! Financial Modeling Prep (FMP) access layer for Ronda.
//!
//! This crate fetches fundamental data from the
//! [Financial Modeling Prep](https://financialmodelingprep.com/) API without
//! breaking the provider's quota:
//!
//! - [`RateLimiter`] keeps grants inside a rolling window.
//! - [`FmpClient`] reads through a [`ronda_cache::ResultCache`], bounds
//!   in-flight requests, and retries transient failures per [`RetryPolicy`].
//! - [`DataFetcher`] turns many endpoint calls into one
//!   [`ronda_traits::FinancialRecord`] per entity.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ronda_fmp::{DataFetcher, FetchConfig, FmpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FmpClient::from_env()?;
//!     let fetcher = DataFetcher::new(client, FetchConfig::default());
//!
//!     let record = fetcher.fetch_record_by_symbol("AAPL").await?;
//!     println!("{} revenue: {:?}", record.symbol(), record.revenue.latest());
//!     Ok(())
//! }
//! ```
//!
//! # Environment Variables
//!
//! Set `FMP_API_KEY` in your environment or `.env` file:
//!
//! ```bash
//! FMP_API_KEY=your_api_key_here
//! ```

pub mod assemble;
mod client;
mod endpoint;
mod error;
mod fetcher;
mod rate_limit;
mod retry;
pub mod types;

pub use assemble::{RawFundamentals, assemble_record};
pub use client::{ClientConfig, FMP_BASE_URL, FmpClient, load_dotenv};
pub use endpoint::{Endpoint, TtlPolicy};
pub use error::FmpError;
pub use fetcher::{DataFetcher, FetchConfig};
pub use rate_limit::RateLimiter;
pub use retry::{RetryPolicy, retry};
pub use types::{Period, SentimentKind};

/// Result type for FMP operations.
pub type Result<T> = std::result::Result<T, FmpError>;
