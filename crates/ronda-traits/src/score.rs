//! Score types produced by analyzers and the quality scorer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::clamp_unit;

/// Output of a single factor analyzer.
///
/// `value` is always inside [0, 1]. `components` holds the weighted parts that
/// produced it, `metrics` the raw numbers the analyzer derived along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScore {
    /// Factor score in [0, 1].
    pub value: f64,
    /// Named component scores, each in [0, 1].
    pub components: BTreeMap<String, f64>,
    /// Raw derived metrics (CAGR, ratios, ...). Only finite values are kept.
    pub metrics: BTreeMap<String, f64>,
}

impl SubScore {
    /// Create a sub-score, clamping `value` into [0, 1].
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value: clamp_unit(value),
            components: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    /// Build a sub-score as a weighted sum of components.
    ///
    /// Components are clamped before weighting; the sum is clamped again.
    #[must_use]
    pub fn weighted(parts: &[(&str, f64, f64)]) -> Self {
        let mut components = BTreeMap::new();
        let mut total = 0.0;
        for &(name, score, weight) in parts {
            let score = clamp_unit(score);
            total += score * weight;
            components.insert(name.to_string(), score);
        }
        Self {
            value: clamp_unit(total),
            components,
            metrics: BTreeMap::new(),
        }
    }

    /// Record a raw metric. Non-finite values are dropped.
    #[must_use]
    pub fn with_metric(mut self, name: &str, value: Option<f64>) -> Self {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.metrics.insert(name.to_string(), v);
        }
        self
    }

    /// Component score by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<f64> {
        self.components.get(name).copied()
    }

    /// Metric by name.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Outcome of a single coherence check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceCheck {
    /// Check name.
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Weight of the check in the multiplier.
    pub weight: f64,
}

/// Composite quality score for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// `clamp(base * coherence_multiplier, 0, 1)`.
    pub composite: f64,
    /// Weighted factor sum before the coherence multiplier.
    pub base: f64,
    /// Growth factor.
    pub growth: SubScore,
    /// Risk factor.
    pub risk: SubScore,
    /// Valuation factor.
    pub valuation: SubScore,
    /// Sentiment factor.
    pub sentiment: SubScore,
    /// Coherence multiplier.
    pub coherence_multiplier: f64,
    /// Individual coherence checks.
    pub coherence_checks: Vec<CoherenceCheck>,
    /// Percentile of `composite` among same-sector peers, 0 to 100.
    pub sector_percentile: f64,
    /// Min-max normalized composite across the final result set, 0 to 1.
    pub normalized: f64,
}
