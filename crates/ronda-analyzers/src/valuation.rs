//! Valuation: multiples against sector ceilings, cash yield, and growth-adjusted P/E.

use ronda_traits::{
    Analyzer, FinancialRecord, SectorBenchmark, SubScore,
    stats::{clamp_unit, series_cagr},
};
use serde::{Deserialize, Serialize};

/// Configuration for the valuation analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Weight of the P/E score (default: 0.30)
    pub pe_weight: f64,
    /// Weight of the P/B score (default: 0.20)
    pub pb_weight: f64,
    /// Weight of the free cash flow yield score (default: 0.30)
    pub fcf_yield_weight: f64,
    /// Weight of the PEG score (default: 0.20)
    pub peg_weight: f64,
    /// Free cash flow yield that counts as adequate (default: 0.04)
    pub min_fcf_yield: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            pe_weight: 0.30,
            pb_weight: 0.20,
            fcf_yield_weight: 0.30,
            peg_weight: 0.20,
            min_fcf_yield: 0.04,
        }
    }
}

/// Valuation analyzer. Cheaper relative to the sector scores higher.
#[derive(Debug, Clone, Default)]
pub struct ValuationAnalyzer {
    config: ValuationConfig,
}

impl ValuationAnalyzer {
    /// Create a valuation analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Yield score from free cash flow yield, banded in multiples of the minimum yield.
    #[must_use]
    pub fn fcf_yield_score(&self, fcf_yield: Option<f64>) -> f64 {
        let Some(y) = fcf_yield.filter(|y| *y > 0.0) else {
            return 0.0;
        };
        let target = self.config.min_fcf_yield;
        if target <= 0.0 || y >= 2.0 * target {
            1.0
        } else if y >= 1.5 * target {
            0.9
        } else if y >= target {
            0.7
        } else if y >= 0.5 * target {
            0.5
        } else if y >= 0.25 * target {
            0.3
        } else {
            0.1
        }
    }
}

/// `1 - multiple / max`; zero at or above the ceiling, for a missing
/// multiple, or a non-positive one.
#[must_use]
pub fn multiple_score(multiple: Option<f64>, max: f64) -> f64 {
    match multiple {
        Some(m) if m > 0.0 && max > 0.0 => clamp_unit(1.0 - m / max),
        _ => 0.0,
    }
}

/// P/E divided by EPS growth in percent. `None` unless both are positive.
#[must_use]
pub fn peg_ratio(pe: Option<f64>, eps_cagr: Option<f64>) -> Option<f64> {
    let (pe, growth) = (pe?, eps_cagr?);
    (pe > 0.0 && growth > 0.0).then(|| pe / (growth * 100.0))
}

fn peg_band(peg: Option<f64>) -> f64 {
    match peg {
        None => 0.0,
        Some(p) if p <= 0.5 => 1.0,
        Some(p) if p <= 0.75 => 0.9,
        Some(p) if p <= 1.0 => 0.8,
        Some(p) if p <= 1.5 => 0.6,
        Some(p) if p <= 2.0 => 0.4,
        Some(p) if p <= 3.0 => 0.2,
        Some(_) => 0.0,
    }
}

impl Analyzer for ValuationAnalyzer {
    fn name(&self) -> &str {
        "valuation"
    }

    fn analyze(&self, record: &FinancialRecord, benchmark: &SectorBenchmark) -> SubScore {
        let fcf_yield = record
            .free_cash_flow
            .latest()
            .filter(|_| record.market_cap > 0.0)
            .map(|fcf| fcf / record.market_cap);
        let peg = peg_ratio(record.pe_ratio, series_cagr(&record.eps));

        SubScore::weighted(&[
            ("pe", multiple_score(record.pe_ratio, benchmark.pe_max), self.config.pe_weight),
            ("pb", multiple_score(record.pb_ratio, benchmark.pb_max), self.config.pb_weight),
            ("fcf_yield", self.fcf_yield_score(fcf_yield), self.config.fcf_yield_weight),
            ("peg", peg_band(peg), self.config.peg_weight),
        ])
        .with_metric("pe_ratio", record.pe_ratio)
        .with_metric("pb_ratio", record.pb_ratio)
        .with_metric("fcf_yield", fcf_yield)
        .with_metric("peg_ratio", peg)
    }
}
