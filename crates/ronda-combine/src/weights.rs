//! Factor weights for the base quality score.

use ronda_traits::{Result, RondaError};
use serde::{Deserialize, Serialize};

/// Tolerance when checking that weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights of the four factors in the base score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    /// Growth quality weight (default: 0.40)
    pub growth: f64,
    /// Risk weight (default: 0.25)
    pub risk: f64,
    /// Valuation weight (default: 0.20)
    pub valuation: f64,
    /// Sentiment weight (default: 0.15)
    pub sentiment: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            growth: 0.40,
            risk: 0.25,
            valuation: 0.20,
            sentiment: 0.15,
        }
    }
}

impl FactorWeights {
    /// Check that every weight is finite and non-negative and that they sum to 1.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Validation`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("growth", self.growth),
            ("risk", self.risk),
            ("valuation", self.valuation),
            ("sentiment", self.sentiment),
        ];
        if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(RondaError::Validation(format!(
                "factor weight {name} must be finite and non-negative, got {w}"
            )));
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RondaError::Validation(format!(
                "factor weights must sum to 1, got {sum}"
            )));
        }
        Ok(())
    }

    /// Weighted sum of the four factor values.
    #[must_use]
    pub fn combine(&self, growth: f64, risk: f64, valuation: f64, sentiment: f64) -> f64 {
        self.growth * growth
            + self.risk * risk
            + self.valuation * valuation
            + self.sentiment * sentiment
    }
}
