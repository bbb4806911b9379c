#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # ronda
//!
//! Fundamental quality screener for listed equities.
//!
//! ronda is an umbrella crate that re-exports the ronda sub-crates and adds
//! the TOML configuration that wires them together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ronda::{RondaConfig, ScreeningCriteria};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RondaConfig::load("ronda.toml")?;
//! let screener = config.build_screener(config.build_client()?)?;
//!
//! let criteria = ScreeningCriteria {
//!     min_market_cap: Some(10e9),
//!     max_pe: Some(30.0),
//!     ..Default::default()
//! };
//! let report = screener.screen(&criteria).await?;
//! for entity in &report.results {
//!     println!("{:<6} {:.3}", entity.symbol(), entity.composite());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Data model, criteria, scores and the [`Analyzer`] trait
//! - [`cache`] - TTL result cache (memory, SQLite, tiered)
//! - [`fmp`] - Rate-limited FMP client and data fetcher
//! - [`analyzers`] - Growth, risk, valuation and sentiment analyzers
//! - [`combine`] - Composite score, coherence, sector percentiles, ranking
//! - [`screen`] - Screening orchestrator and job registry
//! - [`config`] - Configuration file and component builders
//!
//! ## Pipeline
//!
//! 1. **Universe**: profiles for every equity on the configured exchange
//! 2. **Filters**: profile pass, then historical ROE pass
//! 3. **Scoring**: four factor analyzers, weighted and coherence-adjusted
//! 4. **Ranking**: sector percentiles, quality floor, sort and normalize

/// Version information for the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;

/// Data model shared by every ronda crate.
pub mod traits {
    pub use ronda_traits::*;
}

/// TTL result cache.
pub mod cache {
    pub use ronda_cache::*;
}

/// FMP client and data fetcher.
pub mod fmp {
    pub use ronda_fmp::*;
}

/// Factor analyzers.
pub mod analyzers {
    pub use ronda_analyzers::*;
}

/// Composite scoring and ranking.
pub mod combine {
    pub use ronda_combine::*;
}

/// Screening orchestration and jobs.
pub mod screen {
    pub use ronda_screen::*;
}

pub use config::{ConfigError, RondaConfig};
pub use ronda_combine::{QualityScorer, ScoredEntity};
pub use ronda_screen::{JobRegistry, ScreenError, Screener, ScreeningReport};
pub use ronda_traits::{Analyzer, QualityScore, ScreeningCriteria};
