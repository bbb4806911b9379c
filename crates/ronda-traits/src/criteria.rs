//! Screening criteria supplied by callers.

use serde::{Deserialize, Serialize};

use crate::{Result, RondaError};

/// Immutable screening criteria.
///
/// Every numeric bound is optional; `None` means unbounded. The JSON shape
/// matches what presentation layers send (`minMarketCap`, `maxPE`, `minROE`, ...).
///
/// `min_roe` and `min_revenue_growth` are expressed in percent, so `10.0`
/// means 10%. `min_quality_score` is on the composite [0, 1] scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreeningCriteria {
    /// Minimum market capitalization.
    pub min_market_cap: Option<f64>,
    /// Maximum market capitalization.
    pub max_market_cap: Option<f64>,
    /// Maximum trailing P/E ratio.
    #[serde(rename = "maxPE")]
    pub max_pe: Option<f64>,
    /// Minimum ROE every year of the lookback, in percent.
    #[serde(rename = "minROE")]
    pub min_roe: Option<f64>,
    /// Minimum revenue CAGR, in percent.
    pub min_revenue_growth: Option<f64>,
    /// Sector allow-list. Empty means every sector.
    pub sectors: Vec<String>,
    /// Sectors excluded regardless of the allow-list.
    pub exclude_sectors: Vec<String>,
    /// Minimum composite quality score in [0, 1].
    pub min_quality_score: Option<f64>,
}

impl ScreeningCriteria {
    /// Check that every bound is inside its domain.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::Validation`] when a bound is NaN, negative,
    /// inverted (min > max), or a quality score lies outside [0, 1].
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            ("minMarketCap", self.min_market_cap),
            ("maxMarketCap", self.max_market_cap),
            ("maxPE", self.max_pe),
            ("minROE", self.min_roe),
            ("minQualityScore", self.min_quality_score),
        ];
        for (name, value) in bounds {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(RondaError::Validation(format!("{name} must be finite")));
                }
                if v < 0.0 {
                    return Err(RondaError::Validation(format!(
                        "{name} must be non-negative, got {v}"
                    )));
                }
            }
        }

        if let Some(growth) = self.min_revenue_growth {
            if !growth.is_finite() {
                return Err(RondaError::Validation(
                    "minRevenueGrowth must be finite".to_string(),
                ));
            }
        }

        if let (Some(min), Some(max)) = (self.min_market_cap, self.max_market_cap) {
            if min > max {
                return Err(RondaError::Validation(format!(
                    "minMarketCap ({min}) exceeds maxMarketCap ({max})"
                )));
            }
        }

        if let Some(score) = self.min_quality_score {
            if score > 1.0 {
                return Err(RondaError::Validation(format!(
                    "minQualityScore must be within [0, 1], got {score}"
                )));
            }
        }

        Ok(())
    }

    /// Whether `market_cap` falls inside the configured range.
    #[must_use]
    pub fn market_cap_in_range(&self, market_cap: f64) -> bool {
        self.min_market_cap.is_none_or(|min| market_cap >= min)
            && self.max_market_cap.is_none_or(|max| market_cap <= max)
    }

    /// Whether `sector` passes the allow-list and exclusion list.
    ///
    /// Comparison is case-insensitive.
    #[must_use]
    pub fn sector_allowed(&self, sector: &str) -> bool {
        let excluded = self
            .exclude_sectors
            .iter()
            .any(|s| s.eq_ignore_ascii_case(sector));
        let allowed =
            self.sectors.is_empty() || self.sectors.iter().any(|s| s.eq_ignore_ascii_case(sector));
        allowed && !excluded
    }

    /// `min_roe` as a fraction (10% becomes 0.10).
    #[must_use]
    pub fn min_roe_fraction(&self) -> Option<f64> {
        self.min_roe.map(|pct| pct / 100.0)
    }

    /// `min_revenue_growth` as a fraction.
    #[must_use]
    pub fn min_revenue_growth_fraction(&self) -> Option<f64> {
        self.min_revenue_growth.map(|pct| pct / 100.0)
    }
}
