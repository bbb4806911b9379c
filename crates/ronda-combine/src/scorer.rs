//! Composite quality scoring.

use std::collections::BTreeMap;

use ronda_analyzers::{
    GrowthAnalyzer, GrowthConfig, RiskAnalyzer, RiskConfig, SentimentAnalyzer, SentimentConfig,
    ValuationAnalyzer, ValuationConfig,
};
use ronda_traits::{
    Analyzer, CompanyProfile, FinancialRecord, QualityScore, Result, SectorBenchmark,
    SectorBenchmarks, stats::clamp_unit,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{coherence::CoherenceConfig, weights::FactorWeights};

/// Everything the scorer can be tuned with.
///
/// Deserializes from the `[scoring]` table of the configuration file. Sector
/// entries replace or extend the built-in benchmark table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Factor weights of the base score.
    pub weights: FactorWeights,
    /// Coherence multiplier configuration.
    pub coherence: CoherenceConfig,
    /// Growth analyzer configuration.
    pub growth: GrowthConfig,
    /// Risk analyzer configuration.
    pub risk: RiskConfig,
    /// Valuation analyzer configuration.
    pub valuation: ValuationConfig,
    /// Sentiment analyzer configuration.
    pub sentiment: SentimentConfig,
    /// Per-sector benchmark overrides.
    pub sectors: BTreeMap<String, SectorBenchmark>,
    /// Replacement for the fallback benchmark.
    pub default_benchmark: Option<SectorBenchmark>,
}

impl ScoringConfig {
    /// Built-in benchmark table with the configured overrides applied.
    #[must_use]
    pub fn benchmarks(&self) -> SectorBenchmarks {
        let mut table = SectorBenchmarks::default();
        for (sector, benchmark) in &self.sectors {
            table.insert(sector.clone(), *benchmark);
        }
        if let Some(fallback) = self.default_benchmark {
            table.set_fallback(fallback);
        }
        table
    }
}

/// An entity with its profile and composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntity {
    /// Identity and sector.
    pub profile: CompanyProfile,
    /// Market capitalization used for scoring.
    pub market_cap: f64,
    /// Composite quality score and its breakdown.
    pub score: QualityScore,
}

impl ScoredEntity {
    /// Ticker symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.profile.symbol
    }

    /// Sector name.
    #[must_use]
    pub fn sector(&self) -> &str {
        &self.profile.sector
    }

    /// Composite score.
    #[must_use]
    pub const fn composite(&self) -> f64 {
        self.score.composite
    }

    /// Trailing P/E as seen by the valuation analyzer.
    #[must_use]
    pub fn pe_ratio(&self) -> Option<f64> {
        self.score.valuation.metric("pe_ratio")
    }

    /// Revenue CAGR as seen by the growth analyzer.
    #[must_use]
    pub fn revenue_cagr(&self) -> Option<f64> {
        self.score.growth.metric("revenue_cagr")
    }
}

/// Quality scorer.
///
/// Runs the four analyzers against the sector benchmark, blends them with
/// [`FactorWeights`] and applies the coherence multiplier:
///
/// ```text
/// base      = 0.40 G + 0.25 R + 0.20 V + 0.15 S
/// composite = clamp(base * coherence, 0, 1)
/// ```
///
/// Scoring is synchronous and pure; the same record always gives the same score.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    growth: GrowthAnalyzer,
    risk: RiskAnalyzer,
    valuation: ValuationAnalyzer,
    sentiment: SentimentAnalyzer,
    weights: FactorWeights,
    coherence: CoherenceConfig,
    benchmarks: SectorBenchmarks,
}

impl QualityScorer {
    /// Build a scorer from configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the factor weights do not sum to 1 or
    /// the coherence configuration is inconsistent.
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        config.weights.validate()?;
        config.coherence.validate()?;
        Ok(Self {
            growth: GrowthAnalyzer::new(config.growth),
            risk: RiskAnalyzer::new(config.risk),
            valuation: ValuationAnalyzer::new(config.valuation),
            sentiment: SentimentAnalyzer::new(config.sentiment),
            weights: config.weights,
            coherence: config.coherence,
            benchmarks: config.benchmarks(),
        })
    }

    /// Sector benchmark table in use.
    #[must_use]
    pub const fn benchmarks(&self) -> &SectorBenchmarks {
        &self.benchmarks
    }

    /// Factor weights in use.
    #[must_use]
    pub const fn weights(&self) -> &FactorWeights {
        &self.weights
    }

    /// Score one record.
    ///
    /// `sector_percentile` is left at 50 and `normalized` at 0; both are
    /// relative measures filled in by [`assign_sector_percentiles`] and
    /// [`rank`](crate::rank).
    ///
    /// [`assign_sector_percentiles`]: crate::assign_sector_percentiles
    #[must_use]
    pub fn score(&self, record: &FinancialRecord) -> QualityScore {
        let benchmark = self.benchmarks.for_sector(record.sector());
        let growth = self.growth.analyze(record, benchmark);
        let risk = self.risk.analyze(record, benchmark);
        let valuation = self.valuation.analyze(record, benchmark);
        let sentiment = self.sentiment.analyze(record, benchmark);

        let base = clamp_unit(self.weights.combine(
            growth.value,
            risk.value,
            valuation.value,
            sentiment.value,
        ));
        let coherence = self.coherence.evaluate(record);
        let composite = clamp_unit(base * coherence.multiplier);

        debug!(
            symbol = record.symbol(),
            growth = growth.value,
            risk = risk.value,
            valuation = valuation.value,
            sentiment = sentiment.value,
            coherence = coherence.multiplier,
            composite,
            "scored"
        );

        QualityScore {
            composite,
            base,
            growth,
            risk,
            valuation,
            sentiment,
            coherence_multiplier: coherence.multiplier,
            coherence_checks: coherence.checks,
            sector_percentile: 50.0,
            normalized: 0.0,
        }
    }

    /// Score a record and pair it with its profile.
    #[must_use]
    pub fn score_entity(&self, record: &FinancialRecord) -> ScoredEntity {
        ScoredEntity {
            profile: record.profile.clone(),
            market_cap: record.market_cap,
            score: self.score(record),
        }
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        let config = ScoringConfig::default();
        Self {
            growth: GrowthAnalyzer::default(),
            risk: RiskAnalyzer::default(),
            valuation: ValuationAnalyzer::default(),
            sentiment: SentimentAnalyzer::default(),
            weights: config.weights,
            coherence: config.coherence,
            benchmarks: config.benchmarks(),
        }
    }
}
