//! Screening orchestration for the Ronda quality screener.
//!
//! [`Screener`] drives one run end to end:
//!
//! 1. Fetch the universe and apply the profile pass ([`CoarseFilter`])
//! 2. Fetch ROE histories and apply the ROE pass ([`RoeFilter`])
//! 3. Fetch and score every survivor through a bounded stream of pipelines
//! 4. Assign sector percentiles, apply the quality floor and rank
//!
//! [`JobRegistry`] wraps runs as background jobs addressed by UUID.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ronda_combine::QualityScorer;
//! use ronda_fmp::{DataFetcher, FetchConfig, FmpClient};
//! use ronda_screen::{ScreenConfig, Screener};
//! use ronda_traits::ScreeningCriteria;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = DataFetcher::new(FmpClient::from_env()?, FetchConfig::default());
//! let screener = Screener::new(fetcher, Arc::new(QualityScorer::default()), ScreenConfig::default());
//! let criteria = ScreeningCriteria {
//!     min_market_cap: Some(10e9),
//!     ..Default::default()
//! };
//! let report = screener.screen(&criteria).await?;
//! for entity in &report.results {
//!     println!("{} {:.3}", entity.symbol(), entity.composite());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod filter;
mod jobs;
mod report;
mod screener;

pub use error::{JobError, Result, ScreenError};
pub use filter::{CoarseFilter, Rejection, RoeConfig, RoeFilter};
pub use jobs::{JobId, JobRegistry, JobState, JobStatus};
pub use report::{
    EntityFailure, FailureStage, ScreenProgress, ScreenStage, ScreeningReport, StageTimings,
};
pub use screener::{ScreenConfig, Screener};
