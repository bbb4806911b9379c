//! Financial risk: leverage, liquidity, margin stability and cash flow quality.

use ronda_traits::{
    Analyzer, FinancialRecord, SectorBenchmark, SubScore,
    stats::{clamp_unit, stability_score, trend_unit},
};
use serde::{Deserialize, Serialize};

use crate::paired_ratios;

/// Configuration for the risk analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Weight of debt metrics (default: 0.30)
    pub debt_weight: f64,
    /// Weight of working capital (default: 0.25)
    pub working_capital_weight: f64,
    /// Weight of margin stability (default: 0.25)
    pub margin_stability_weight: f64,
    /// Weight of cash flow quality (default: 0.20)
    pub cash_flow_weight: f64,
    /// Interest coverage below which the debt score is forced to 0 (default: 1.5)
    pub coverage_floor: f64,
    /// Interest coverage at or above which the debt score is forced to 1 (default: 10)
    pub coverage_ceiling: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            debt_weight: 0.30,
            working_capital_weight: 0.25,
            margin_stability_weight: 0.25,
            cash_flow_weight: 0.20,
            coverage_floor: 1.5,
            coverage_ceiling: 10.0,
        }
    }
}

/// Risk analyzer. A higher score means lower risk.
#[derive(Debug, Clone, Default)]
pub struct RiskAnalyzer {
    config: RiskConfig,
}

impl RiskAnalyzer {
    /// Create a risk analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Leverage score in [0, 1].
    ///
    /// Blends debt-to-equity against the sector ceiling with coverage and
    /// debt/EBITDA bands, then applies the coverage overrides.
    #[must_use]
    pub fn debt_score(&self, record: &FinancialRecord, benchmark: &SectorBenchmark) -> f64 {
        let coverage = record.interest_coverage.latest();
        if let Some(c) = coverage {
            if c < self.config.coverage_floor {
                return 0.0;
            }
            if c >= self.config.coverage_ceiling {
                return 1.0;
            }
        }

        let de_score = match record.debt_to_equity() {
            None => 0.5,
            Some(de) if de <= 0.0 => 1.0,
            Some(de) if de >= benchmark.debt_to_equity_max => 0.0,
            Some(de) => 1.0 - de / benchmark.debt_to_equity_max,
        };
        let coverage_score = coverage.map_or(0.5, coverage_band);
        let ebitda_score = record.debt_to_ebitda.latest().map_or(1.0, debt_to_ebitda_band);

        clamp_unit(0.35 * de_score + 0.35 * coverage_score + 0.30 * ebitda_score)
    }

    fn working_capital_score(record: &FinancialRecord) -> f64 {
        let recent = record.working_capital.recent(3);
        let positive = if !recent.is_empty() && recent.iter().all(|wc| *wc > 0.0) {
            1.0
        } else {
            0.0
        };
        let trend = trend_unit(&record.working_capital.present());
        let ratio_score = paired_ratios(&record.working_capital, &record.revenue)
            .last()
            .map_or(0.3, |r| working_capital_band(*r));
        0.3 * positive + 0.3 * trend + 0.4 * ratio_score
    }

    fn margin_stability_score(record: &FinancialRecord) -> f64 {
        let gross = record.gross_margin.present();
        let operating = record.operating_margin.present();
        0.25 * stability_score(&gross)
            + 0.25 * stability_score(&operating)
            + 0.25 * trend_unit(&gross)
            + 0.25 * trend_unit(&operating)
    }

    fn cash_flow_score(record: &FinancialRecord) -> f64 {
        let conversion = record.ocf_to_net_income().map_or(0.0, cash_conversion_band);
        let recent = record.free_cash_flow.recent(3);
        let all_positive = if recent.len() == 3 && recent.iter().all(|f| *f > 0.0) {
            1.0
        } else {
            0.0
        };
        let fcf = record.free_cash_flow.present();
        0.4 * conversion + 0.2 * all_positive + 0.2 * stability_score(&fcf) + 0.2 * trend_unit(&fcf)
    }
}

const fn coverage_band(coverage: f64) -> f64 {
    if coverage <= 0.0 {
        0.5
    } else if coverage < 1.5 {
        0.0
    } else if coverage < 3.0 {
        0.3
    } else if coverage < 5.0 {
        0.6
    } else if coverage < 10.0 {
        0.8
    } else {
        1.0
    }
}

const fn debt_to_ebitda_band(ratio: f64) -> f64 {
    if ratio <= 1.0 {
        1.0
    } else if ratio <= 2.0 {
        0.8
    } else if ratio <= 3.0 {
        0.6
    } else if ratio <= 4.0 {
        0.4
    } else if ratio <= 5.0 {
        0.2
    } else {
        0.0
    }
}

/// Working capital over revenue; 10% to 30% is the sweet spot.
const fn working_capital_band(ratio: f64) -> f64 {
    if ratio < 0.0 {
        0.0
    } else if ratio == 0.0 {
        0.3
    } else if ratio < 0.1 {
        0.5
    } else if ratio <= 0.3 {
        1.0
    } else if ratio <= 0.5 {
        0.7
    } else {
        0.4
    }
}

/// Operating cash flow over net income; peaks in [0.9, 1.2].
const fn cash_conversion_band(ratio: f64) -> f64 {
    if ratio <= 0.0 {
        0.0
    } else if ratio < 0.7 {
        0.3
    } else if ratio < 0.9 {
        0.7
    } else if ratio <= 1.2 {
        1.0
    } else if ratio <= 1.5 {
        0.8
    } else if ratio <= 2.0 {
        0.6
    } else {
        0.4
    }
}

impl Analyzer for RiskAnalyzer {
    fn name(&self) -> &str {
        "risk"
    }

    fn analyze(&self, record: &FinancialRecord, benchmark: &SectorBenchmark) -> SubScore {
        SubScore::weighted(&[
            ("debt", self.debt_score(record, benchmark), self.config.debt_weight),
            (
                "working_capital",
                Self::working_capital_score(record),
                self.config.working_capital_weight,
            ),
            (
                "margin_stability",
                Self::margin_stability_score(record),
                self.config.margin_stability_weight,
            ),
            ("cash_flow_quality", Self::cash_flow_score(record), self.config.cash_flow_weight),
        ])
        .with_metric("debt_to_equity", record.debt_to_equity())
        .with_metric("interest_coverage", record.interest_coverage.latest())
        .with_metric("debt_to_ebitda", record.debt_to_ebitda.latest())
        .with_metric("ocf_to_net_income", record.ocf_to_net_income())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record_with;
    use approx::assert_relative_eq;
    use ronda_traits::Series;

    #[test]
    fn test_weak_coverage_zeroes_debt() {
        let record = record_with(|r| {
            r.interest_coverage = Series::from_values(&[8.0, 4.0, 1.2]);
            r.total_debt = Series::from_values(&[0.0, 0.0, 0.0]);
        });
        let score = RiskAnalyzer::default().analyze(&record, &SectorBenchmark::DEFAULT);
        assert_relative_eq!(score.component("debt").unwrap(), 0.0);
    }

    #[test]
    fn test_strong_coverage_maxes_debt() {
        let record = record_with(|r| {
            r.interest_coverage = Series::from_values(&[12.0]);
            r.total_debt = Series::from_values(&[500.0]);
            r.total_equity = Series::from_values(&[100.0]);
        });
        let analyzer = RiskAnalyzer::default();
        assert_relative_eq!(analyzer.debt_score(&record, &SectorBenchmark::DEFAULT), 1.0);
    }

    #[test]
    fn test_negative_equity_counts_as_ceiling() {
        let record = record_with(|r| {
            r.total_debt = Series::from_values(&[100.0]);
            r.total_equity = Series::from_values(&[-50.0]);
            r.interest_coverage = Series::from_values(&[4.0]);
            r.debt_to_ebitda = Series::from_values(&[2.5]);
        });
        let debt = RiskAnalyzer::default().debt_score(&record, &SectorBenchmark::DEFAULT);
        assert_relative_eq!(debt, 0.35 * 0.0 + 0.35 * 0.6 + 0.30 * 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_leverage_is_neutral() {
        let record = record_with(|r| {
            r.total_debt = Series::from_values(&[100.0]);
        });
        let debt = RiskAnalyzer::default().debt_score(&record, &SectorBenchmark::DEFAULT);
        assert_relative_eq!(debt, 0.35 * 0.5 + 0.35 * 0.5 + 0.30 * 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_debt_to_equity_scales_against_sector_ceiling() {
        let record = record_with(|r| {
            r.total_debt = Series::from_values(&[100.0]);
            r.total_equity = Series::from_values(&[100.0]);
        });
        let benchmark = SectorBenchmark {
            debt_to_equity_max: 2.0,
            ..SectorBenchmark::DEFAULT
        };
        let debt = RiskAnalyzer::default().debt_score(&record, &benchmark);
        // D/E 1.0 against 2.0: 0.5; unknown coverage neutral; no EBITDA ratio.
        assert_relative_eq!(debt, 0.35 * 0.5 + 0.35 * 0.5 + 0.30 * 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bands() {
        assert_relative_eq!(cash_conversion_band(1.0), 1.0);
        assert_relative_eq!(cash_conversion_band(0.5), 0.3);
        assert_relative_eq!(cash_conversion_band(2.5), 0.4);
        assert_relative_eq!(working_capital_band(0.2), 1.0);
        assert_relative_eq!(working_capital_band(-0.1), 0.0);
        assert_relative_eq!(debt_to_ebitda_band(6.0), 0.0);
        assert_relative_eq!(coverage_band(4.0), 0.6);
    }

    #[test]
    fn test_healthy_record_scores_high() {
        let record = record_with(|r| {
            r.revenue = Series::from_values(&[100.0, 110.0, 120.0]);
            r.working_capital = Series::from_values(&[20.0, 22.0, 24.0]);
            r.gross_margin = Series::from_values(&[0.5, 0.5, 0.5]);
            r.operating_margin = Series::from_values(&[0.2, 0.2, 0.2]);
            r.net_income = Series::from_values(&[10.0, 11.0, 12.0]);
            r.operating_cash_flow = Series::from_values(&[11.0, 12.0, 13.0]);
            r.free_cash_flow = Series::from_values(&[8.0, 9.0, 10.0]);
            r.total_debt = Series::from_values(&[0.0, 0.0, 0.0]);
        });
        let score = RiskAnalyzer::default().analyze(&record, &SectorBenchmark::DEFAULT);
        assert!(score.value > 0.75, "{}", score.value);
        assert!(score.value <= 1.0);
    }

    #[test]
    fn test_empty_record_is_bounded() {
        let score = RiskAnalyzer::default().analyze(&record_with(|_| {}), &SectorBenchmark::DEFAULT);
        assert!((0.0..=1.0).contains(&score.value));
    }
}
