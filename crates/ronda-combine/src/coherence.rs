//! Cross-factor coherence checks and the multiplier they produce.
//!
//! A record whose fundamentals tell one consistent story (growing revenue
//! backed by growing cash flow, stable margins with high returns, a P/E that
//! matches its growth) earns a multiplier above 1. Contradictions pull it
//! towards the lower bound.

use ronda_traits::{
    CoherenceCheck, FinancialRecord, Result, RondaError,
    stats::{stability_score, trend_score},
};
use serde::{Deserialize, Serialize};

/// Growth and free cash flow move in the same direction.
pub const GROWTH_CASH_FLOW: &str = "growth_cash_flow";
/// Stable operating margins together with a high ROE.
pub const MARGIN_PROFITABILITY: &str = "margin_profitability";
/// Fast EPS growth with a high P/E, or slow growth with a low one.
pub const GROWTH_VALUATION: &str = "growth_valuation";
/// Low leverage together with strong cash conversion.
pub const LEVERAGE_CASH_FLOW: &str = "leverage_cash_flow";
/// Revenue and EPS both grow steadily.
pub const REVENUE_EARNINGS: &str = "revenue_earnings";

/// Configuration of the coherence multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceConfig {
    /// Multiplier when no check passes (default: 0.90)
    pub min_multiplier: f64,
    /// Multiplier when every check passes (default: 1.15)
    pub max_multiplier: f64,
    /// Weight of the growth and cash flow agreement check (default: 1.0)
    pub growth_cash_flow_weight: f64,
    /// Weight of the margins and profitability check (default: 1.0)
    pub margin_profitability_weight: f64,
    /// Weight of the growth and valuation agreement check (default: 1.0)
    pub growth_valuation_weight: f64,
    /// Weight of the leverage and cash flow check (default: 1.0)
    pub leverage_cash_flow_weight: f64,
    /// Weight of the revenue and earnings consistency check (default: 1.0)
    pub revenue_earnings_weight: f64,
    /// Stability above which a series counts as steady (default: 0.7)
    pub stability_threshold: f64,
    /// ROE above which profitability counts as high (default: 0.15)
    pub high_roe: f64,
    /// P/E above which a valuation counts as high (default: 20)
    pub high_pe: f64,
    /// EPS growth over the lookback that counts as fast (default: 0.15)
    pub fast_eps_growth: f64,
    /// Debt-to-equity below which leverage counts as low (default: 1.0)
    pub low_debt_to_equity: f64,
    /// Operating cash flow over net income above which cash flow counts as strong (default: 1.0)
    pub strong_cash_conversion: f64,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            min_multiplier: 0.90,
            max_multiplier: 1.15,
            growth_cash_flow_weight: 1.0,
            margin_profitability_weight: 1.0,
            growth_valuation_weight: 1.0,
            leverage_cash_flow_weight: 1.0,
            revenue_earnings_weight: 1.0,
            stability_threshold: 0.7,
            high_roe: 0.15,
            high_pe: 20.0,
            fast_eps_growth: 0.15,
            low_debt_to_equity: 1.0,
            strong_cash_conversion: 1.0,
        }
    }
}

impl CoherenceConfig {
    /// Check the multiplier bounds and the check weights.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Validation`] when a bound is not positive, the
    /// bounds are inverted, or a weight is negative.
    pub fn validate(&self) -> Result<()> {
        if self.min_multiplier <= 0.0 || !self.min_multiplier.is_finite() {
            return Err(RondaError::Validation(format!(
                "coherence min_multiplier must be positive, got {}",
                self.min_multiplier
            )));
        }
        if self.max_multiplier < self.min_multiplier || !self.max_multiplier.is_finite() {
            return Err(RondaError::Validation(format!(
                "coherence max_multiplier ({}) is below min_multiplier ({})",
                self.max_multiplier, self.min_multiplier
            )));
        }
        let negative = self
            .weights()
            .into_iter()
            .find(|(_, w)| !w.is_finite() || *w < 0.0);
        if let Some((name, w)) = negative {
            return Err(RondaError::Validation(format!(
                "coherence weight {name} must be non-negative, got {w}"
            )));
        }
        Ok(())
    }

    const fn weights(&self) -> [(&'static str, f64); 5] {
        [
            (GROWTH_CASH_FLOW, self.growth_cash_flow_weight),
            (MARGIN_PROFITABILITY, self.margin_profitability_weight),
            (GROWTH_VALUATION, self.growth_valuation_weight),
            (LEVERAGE_CASH_FLOW, self.leverage_cash_flow_weight),
            (REVENUE_EARNINGS, self.revenue_earnings_weight),
        ]
    }

    /// Run every check against `record` and derive the multiplier.
    #[must_use]
    pub fn evaluate(&self, record: &FinancialRecord) -> Coherence {
        let outcomes = [
            self.growth_cash_flow(record),
            self.margin_profitability(record),
            self.growth_valuation(record),
            self.leverage_cash_flow(record),
            self.revenue_earnings(record),
        ];
        let checks: Vec<CoherenceCheck> = self
            .weights()
            .into_iter()
            .zip(outcomes)
            .map(|((name, weight), passed)| CoherenceCheck {
                name: name.to_string(),
                passed,
                weight,
            })
            .collect();
        let multiplier = self.multiplier(&checks);
        Coherence { multiplier, checks }
    }

    /// `min + passed_weight / total_weight * (max - min)`.
    ///
    /// With zero total weight no check can move the score, so the multiplier is 1.
    #[must_use]
    pub fn multiplier(&self, checks: &[CoherenceCheck]) -> f64 {
        let total: f64 = checks.iter().map(|c| c.weight).sum();
        if total <= 0.0 {
            return 1.0_f64.clamp(self.min_multiplier, self.max_multiplier);
        }
        let passed: f64 = checks.iter().filter(|c| c.passed).map(|c| c.weight).sum();
        self.min_multiplier + (passed / total) * (self.max_multiplier - self.min_multiplier)
    }

    fn growth_cash_flow(&self, record: &FinancialRecord) -> bool {
        let revenue_growing = trend_score(&record.revenue.present()) > 0.0;
        let fcf_growing = trend_score(&record.free_cash_flow.present()) > 0.0;
        revenue_growing == fcf_growing
    }

    fn margin_profitability(&self, record: &FinancialRecord) -> bool {
        let stable = stability_score(&record.operating_margin.present()) > self.stability_threshold;
        let profitable = record.roe.latest().is_some_and(|roe| roe > self.high_roe);
        stable && profitable
    }

    fn growth_valuation(&self, record: &FinancialRecord) -> bool {
        let fast_growth = record
            .eps
            .endpoints()
            .is_some_and(|(first, last, _)| last > first * (1.0 + self.fast_eps_growth));
        let high_pe = record.pe_ratio.is_some_and(|pe| pe > self.high_pe);
        fast_growth == high_pe
    }

    fn leverage_cash_flow(&self, record: &FinancialRecord) -> bool {
        let low_debt = record
            .debt_to_equity()
            .is_none_or(|de| de < self.low_debt_to_equity);
        let strong_cash = record
            .ocf_to_net_income()
            .is_some_and(|ratio| ratio > self.strong_cash_conversion);
        low_debt && strong_cash
    }

    fn revenue_earnings(&self, record: &FinancialRecord) -> bool {
        stability_score(&record.revenue.present()) > self.stability_threshold
            && stability_score(&record.eps.present()) > self.stability_threshold
    }
}

/// Result of the coherence checks for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Coherence {
    /// Multiplier applied to the base score.
    pub multiplier: f64,
    /// Outcome of every check, in a fixed order.
    pub checks: Vec<CoherenceCheck>,
}

impl Coherence {
    /// Number of checks that passed.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }
}
