#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the Ronda quality screener.
//!
//! This crate holds the data model shared by every other crate: screening
//! criteria, per-entity financial records, factor and quality scores, sector
//! benchmarks, and the [`Analyzer`] trait that factor analyzers implement.

/// The version of the ronda-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analyzer;
pub mod benchmark;
pub mod criteria;
pub mod error;
pub mod record;
pub mod score;
pub mod stats;
pub mod types;

pub use analyzer::Analyzer;
pub use benchmark::{SectorBenchmark, SectorBenchmarks};
pub use criteria::ScreeningCriteria;
pub use error::{Result, RondaError};
pub use record::{
    CompanyProfile, EarningsSurprise, FinancialRecord, InsiderActivity, Series, SocialSentiment,
};
pub use score::{CoherenceCheck, QualityScore, SubScore};
pub use types::{FiscalYear, Symbol};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
