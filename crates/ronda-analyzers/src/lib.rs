//! Factor analyzers for the Ronda quality screener.
//!
//! Each analyzer turns one [`FinancialRecord`](ronda_traits::FinancialRecord)
//! into a [`SubScore`](ronda_traits::SubScore) in [0, 1]:
//! - Growth: magnitude, consistency and sustainability of revenue, EPS and FCF growth
//! - Risk: leverage, working capital, margin stability and cash flow quality
//! - Valuation: P/E and P/B against sector ceilings, FCF yield and PEG
//! - Sentiment: insider trading, earnings surprises and social sentiment
//!
//! # Example
//!
//! ```ignore
//! use ronda_analyzers::GrowthAnalyzer;
//! use ronda_traits::{Analyzer, SectorBenchmarks};
//!
//! let benchmarks = SectorBenchmarks::default();
//! let growth = GrowthAnalyzer::default();
//! let score = growth.analyze(&record, benchmarks.for_sector(record.sector()));
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod growth;
pub mod risk;
pub mod sentiment;
pub mod valuation;

pub use growth::{GrowthAnalyzer, GrowthConfig};
pub use risk::{RiskAnalyzer, RiskConfig};
pub use sentiment::{SentimentAnalyzer, SentimentConfig};
pub use valuation::{ValuationAnalyzer, ValuationConfig};

use ronda_traits::Series;

/// Year-aligned `numerator / denominator` for years where both are present
/// and the denominator is positive.
pub(crate) fn paired_ratios(numerator: &Series, denominator: &Series) -> Vec<f64> {
    numerator
        .slots()
        .iter()
        .zip(denominator.slots())
        .filter_map(|pair| match pair {
            (Some(n), Some(d)) if *d > 0.0 => Some(n / d),
            _ => None,
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_ratios_skip_gaps_and_non_positive() {
        let num = Series::new(vec![Some(1.0), Some(2.0), None, Some(4.0)]);
        let den = Series::new(vec![Some(10.0), Some(0.0), Some(5.0), Some(8.0)]);
        assert_eq!(paired_ratios(&num, &den), vec![0.1, 0.5]);
    }
}
