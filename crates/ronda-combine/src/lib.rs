//! Quality scoring and ranking for the Ronda quality screener.
//!
//! This crate turns analyzer output into a composite quality score and puts
//! scored entities in order:
//! - [`QualityScorer`] blends the four factor sub-scores with [`FactorWeights`]
//!   and applies the [`CoherenceConfig`] multiplier
//! - [`assign_sector_percentiles`] ranks composites among same-sector peers
//! - [`rank`] applies the minimum quality filter, sorts and normalizes
//!
//! # Examples
//!
//! ```rust,no_run
//! use ronda_combine::{QualityScorer, assign_sector_percentiles, rank};
//! # fn records() -> Vec<ronda_traits::FinancialRecord> { Vec::new() }
//!
//! let scorer = QualityScorer::default();
//! let mut scored: Vec<_> = records().iter().map(|r| scorer.score_entity(r)).collect();
//! assign_sector_percentiles(&mut scored);
//! let ranked = rank(scored, Some(0.6), Some(50));
//! ```

pub mod coherence;
mod percentile;
mod ranking;
mod scorer;
mod weights;

pub use coherence::{Coherence, CoherenceConfig};
pub use percentile::{LONE_ENTITY_PERCENTILE, assign_sector_percentiles};
pub use ranking::rank;
pub use scorer::{QualityScorer, ScoredEntity, ScoringConfig};
pub use weights::FactorWeights;

#[cfg(test)]
pub(crate) mod test_support {
    use ronda_traits::{CompanyProfile, QualityScore, SubScore};

    use crate::ScoredEntity;

    /// An entity with a fixed composite and empty factor breakdown.
    pub(crate) fn entity(symbol: &str, sector: &str, composite: f64) -> ScoredEntity {
        ScoredEntity {
            profile: CompanyProfile {
                symbol: symbol.to_string(),
                name: symbol.to_string(),
                sector: sector.to_string(),
                industry: String::new(),
                price: Some(10.0),
                market_cap: Some(1e9),
                is_etf: false,
                is_actively_trading: true,
            },
            market_cap: 1e9,
            score: QualityScore {
                composite,
                base: composite,
                growth: SubScore::default(),
                risk: SubScore::default(),
                valuation: SubScore::default(),
                sentiment: SubScore::default(),
                coherence_multiplier: 1.0,
                coherence_checks: Vec::new(),
                sector_percentile: 50.0,
                normalized: 0.0,
            },
        }
    }
}
