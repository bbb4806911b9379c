//! Growth quality: how fast, how steadily, and how sustainably an entity grows.

use ronda_traits::{
    Analyzer, FinancialRecord, SectorBenchmark, Series, SubScore,
    stats::{clamp_unit, mean, sample_std, series_cagr, stability_score, trend_unit},
};
use serde::{Deserialize, Serialize};

use crate::paired_ratios;

/// Configuration for the growth analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Weight of growth magnitude (default: 0.35)
    pub magnitude_weight: f64,
    /// Weight of growth consistency (default: 0.35)
    pub consistency_weight: f64,
    /// Weight of growth sustainability (default: 0.30)
    pub sustainability_weight: f64,
    /// Added to consistency when every year grew (default: 0.2)
    pub all_positive_bonus: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            magnitude_weight: 0.35,
            consistency_weight: 0.35,
            sustainability_weight: 0.30,
            all_positive_bonus: 0.2,
        }
    }
}

/// Growth analyzer.
///
/// Scores revenue, EPS and free cash flow growth against the sector targets:
/// - Magnitude: CAGR relative to target on a log2 scale, 0.5 at target
/// - Consistency: `1 / (1 + CV)` of year-over-year growth
/// - Sustainability: reinvestment, margin and cash conversion trends
#[derive(Debug, Clone, Default)]
pub struct GrowthAnalyzer {
    config: GrowthConfig,
}

impl GrowthAnalyzer {
    /// Create a growth analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: GrowthConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Consistency of year-over-year growth in [0, 1].
    ///
    /// Fewer than two growth observations, or a non-positive mean growth, score 0.
    #[must_use]
    pub fn consistency_score(&self, series: &Series) -> f64 {
        let growth = series.yoy_growth();
        if growth.len() < 2 {
            return 0.0;
        }
        let Some(avg) = mean(&growth).filter(|m| *m > 0.0) else {
            return 0.0;
        };
        let cv = sample_std(&growth).unwrap_or(0.0) / avg;
        let bonus = if growth.iter().all(|g| *g > 0.0) {
            self.config.all_positive_bonus
        } else {
            0.0
        };
        clamp_unit(1.0 / (1.0 + cv) + bonus)
    }

    fn sustainability_score(record: &FinancialRecord) -> f64 {
        let rd_intensity = paired_ratios(&record.rd_expense, &record.revenue);
        let capex_efficiency = paired_ratios(&record.free_cash_flow, &record.capex);
        let fcf_conversion = paired_ratios(&record.free_cash_flow, &record.revenue);
        let parts = [
            trend_unit(&rd_intensity),
            trend_unit(&capex_efficiency),
            stability_score(&record.operating_margin.present()),
            trend_unit(&fcf_conversion),
            record.ocf_to_net_income().map_or(0.0, earnings_quality_band),
        ];
        parts.iter().sum::<f64>() / parts.len() as f64
    }
}

/// Magnitude score of `cagr` against `target`.
///
/// 0 when either is non-positive, 0.5 at target, 1 at twice the target or more.
#[must_use]
pub fn magnitude_score(cagr: Option<f64>, target: f64) -> f64 {
    let Some(cagr) = cagr else {
        return 0.0;
    };
    if target <= 0.0 || cagr <= 0.0 {
        return 0.0;
    }
    let ratio = cagr / target;
    if ratio >= 2.0 {
        return 1.0;
    }
    clamp_unit(0.5 * (1.0 + ratio.log2()))
}

/// Operating cash flow over net income; best when cash slightly exceeds earnings.
fn earnings_quality_band(ratio: f64) -> f64 {
    if (0.9..=1.3).contains(&ratio) {
        1.0
    } else if ratio > 0.7 && ratio < 1.5 {
        0.7
    } else if ratio > 0.5 && ratio < 1.7 {
        0.4
    } else {
        0.1
    }
}

impl Analyzer for GrowthAnalyzer {
    fn name(&self) -> &str {
        "growth"
    }

    fn analyze(&self, record: &FinancialRecord, benchmark: &SectorBenchmark) -> SubScore {
        let revenue_cagr = series_cagr(&record.revenue);
        let eps_cagr = series_cagr(&record.eps);
        let fcf_cagr = series_cagr(&record.free_cash_flow);

        let magnitude = (magnitude_score(revenue_cagr, benchmark.revenue_growth)
            + magnitude_score(eps_cagr, benchmark.eps_growth)
            + magnitude_score(fcf_cagr, benchmark.fcf_growth))
            / 3.0;
        let consistency = (self.consistency_score(&record.revenue)
            + self.consistency_score(&record.eps)
            + self.consistency_score(&record.free_cash_flow))
            / 3.0;
        let sustainability = Self::sustainability_score(record);

        SubScore::weighted(&[
            ("magnitude", magnitude, self.config.magnitude_weight),
            ("consistency", consistency, self.config.consistency_weight),
            ("sustainability", sustainability, self.config.sustainability_weight),
        ])
        .with_metric("revenue_cagr", revenue_cagr)
        .with_metric("eps_cagr", eps_cagr)
        .with_metric("fcf_cagr", fcf_cagr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;
    use approx::assert_relative_eq;

    fn compound(start: f64, rate: f64, years: usize) -> Vec<f64> {
        (0..years).map(|i| start * (1.0 + rate).powi(i as i32)).collect()
    }

    #[test]
    fn test_magnitude_scale() {
        assert_relative_eq!(magnitude_score(Some(0.10), 0.10), 0.5, epsilon = 1e-12);
        assert_relative_eq!(magnitude_score(Some(0.20), 0.10), 1.0);
        assert_relative_eq!(magnitude_score(Some(0.05), 0.10), 0.0, epsilon = 1e-12);
        assert_relative_eq!(magnitude_score(Some(0.0), 0.10), 0.0);
        assert_relative_eq!(magnitude_score(Some(0.1), 0.0), 0.0);
        assert_relative_eq!(magnitude_score(None, 0.10), 0.0);
    }

    #[test]
    fn test_target_growth_with_zero_variance() {
        let benchmark = SectorBenchmark::DEFAULT;
        let record = record_with(|r| {
            r.revenue = compound(100.0, benchmark.revenue_growth, 5).into();
            r.eps = compound(2.0, benchmark.eps_growth, 5).into();
            r.free_cash_flow = compound(10.0, benchmark.fcf_growth, 5).into();
        });

        let score = GrowthAnalyzer::default().analyze(&record, &benchmark);
        assert_relative_eq!(score.component("magnitude").unwrap(), 0.5, epsilon = 1e-9);
        assert!(score.component("consistency").unwrap() >= 0.8);
        assert_relative_eq!(score.metric("revenue_cagr").unwrap(), 0.10, epsilon = 1e-9);
    }

    #[test]
    fn test_consistency_rules() {
        let analyzer = GrowthAnalyzer::default();
        // One growth observation is not enough.
        assert_relative_eq!(analyzer.consistency_score(&vec![1.0, 2.0].into()), 0.0);
        // Shrinking on average scores zero.
        assert_relative_eq!(analyzer.consistency_score(&vec![10.0, 8.0, 6.0].into()), 0.0);
        // Mixed but net growing: no bonus.
        let mixed = analyzer.consistency_score(&vec![10.0, 12.0, 11.0, 14.0].into());
        assert!(mixed > 0.0 && mixed < 1.0);
    }

    #[test]
    fn test_empty_record_is_bounded() {
        let record = record_with(|_| {});
        let score = GrowthAnalyzer::default().analyze(&record, &SectorBenchmark::DEFAULT);
        assert!((0.0..=1.0).contains(&score.value));
        assert_relative_eq!(score.component("magnitude").unwrap(), 0.0);
    }

    #[test]
    fn test_negative_and_gappy_series_stay_bounded() {
        let record = record_with(|r| {
            r.revenue = Series::new(vec![Some(100.0), None, Some(-5.0), Some(300.0)]);
            r.eps = Series::new(vec![Some(-1.0), Some(-2.0), Some(0.0)]);
            r.free_cash_flow = Series::new(vec![Some(f64::NAN), Some(1e12), Some(1.0)]);
            r.capex = Series::from_values(&[0.0, 0.0, 10.0]);
            r.operating_margin = Series::from_values(&[0.0, 0.0, 0.0]);
        });
        let score = GrowthAnalyzer::default().analyze(&record, &SectorBenchmark::DEFAULT);
        assert!((0.0..=1.0).contains(&score.value));
        for value in score.components.values() {
            assert!((0.0..=1.0).contains(value));
        }
    }
}
