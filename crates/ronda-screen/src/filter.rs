//! Coarse filters applied before the expensive full-record fetch.

use std::fmt;

use ronda_combine::ScoredEntity;
use ronda_traits::{CompanyProfile, ScreeningCriteria, Series, stats::mean};
use serde::{Deserialize, Serialize};

/// Why an entity was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum Rejection {
    /// Listed as an ETF.
    Etf,
    /// Flagged as no longer trading.
    NotTrading,
    /// Missing or non-positive price.
    NoPrice,
    /// Missing market cap or outside the criteria range.
    MarketCap,
    /// Sector not allowed or explicitly excluded.
    Sector,
    /// Fewer ROE observations than the lookback requires.
    RoeHistory {
        /// Observations available.
        years: usize,
    },
    /// Average ROE over the lookback below the floor.
    RoeAverage {
        /// Observed average.
        average: f64,
    },
    /// A single year of ROE below the floor.
    RoeYear {
        /// Lowest observed value.
        lowest: f64,
    },
    /// P/E missing, non-positive or above the criteria ceiling.
    PeRatio,
    /// Revenue CAGR missing or below the criteria floor.
    RevenueGrowth,
}

impl Rejection {
    /// Short stable label, used for logging and counting.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Etf => "etf",
            Self::NotTrading => "not_trading",
            Self::NoPrice => "no_price",
            Self::MarketCap => "market_cap",
            Self::Sector => "sector",
            Self::RoeHistory { .. } => "roe_history",
            Self::RoeAverage { .. } => "roe_average",
            Self::RoeYear { .. } => "roe_year",
            Self::PeRatio => "pe_ratio",
            Self::RevenueGrowth => "revenue_growth",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoeHistory { years } => write!(f, "only {years} years of ROE"),
            Self::RoeAverage { average } => write!(f, "average ROE {:.1}%", average * 100.0),
            Self::RoeYear { lowest } => write!(f, "ROE year at {:.1}%", lowest * 100.0),
            other => f.write_str(other.label()),
        }
    }
}

/// Profile pass: market cap, sector lists, price and instrument type.
#[derive(Debug, Clone, Copy)]
pub struct CoarseFilter<'a> {
    criteria: &'a ScreeningCriteria,
}

impl<'a> CoarseFilter<'a> {
    /// Filter against `criteria`.
    #[must_use]
    pub const fn new(criteria: &'a ScreeningCriteria) -> Self {
        Self { criteria }
    }

    /// Check one profile.
    ///
    /// # Errors
    ///
    /// Returns the first [`Rejection`] the profile hits.
    pub fn check(&self, profile: &CompanyProfile) -> Result<(), Rejection> {
        if profile.is_etf {
            return Err(Rejection::Etf);
        }
        if !profile.is_actively_trading {
            return Err(Rejection::NotTrading);
        }
        if !profile.price.is_some_and(|p| p > 0.0) {
            return Err(Rejection::NoPrice);
        }
        if !profile
            .market_cap
            .is_some_and(|cap| self.criteria.market_cap_in_range(cap))
        {
            return Err(Rejection::MarketCap);
        }
        if !self.criteria.sector_allowed(&profile.sector) {
            return Err(Rejection::Sector);
        }
        Ok(())
    }

    /// Record-level criteria, applied once a score exists.
    ///
    /// # Errors
    ///
    /// [`Rejection::PeRatio`] when `maxPE` is set and the P/E is missing,
    /// non-positive or above it; [`Rejection::RevenueGrowth`] when
    /// `minRevenueGrowth` is set and the revenue CAGR is missing or below it.
    pub fn check_scored(&self, entity: &ScoredEntity) -> Result<(), Rejection> {
        let pe_ok = |max: f64| entity.pe_ratio().is_some_and(|pe| pe > 0.0 && pe <= max);
        if self.criteria.max_pe.is_some_and(|max| !pe_ok(max)) {
            return Err(Rejection::PeRatio);
        }
        let growth_ok = |min: f64| entity.revenue_cagr().is_some_and(|g| g >= min);
        if self
            .criteria
            .min_revenue_growth_fraction()
            .is_some_and(|min| !growth_ok(min))
        {
            return Err(Rejection::RevenueGrowth);
        }
        Ok(())
    }
}

/// Thresholds of the historical ROE pass. Values are fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoeConfig {
    /// Most recent years considered (default: 3)
    pub years: usize,
    /// Minimum average over those years (default: 0.15)
    pub min_average: f64,
    /// Minimum for every single year (default: 0.10)
    pub min_each_year: f64,
}

impl Default for RoeConfig {
    fn default() -> Self {
        Self {
            years: 3,
            min_average: 0.15,
            min_each_year: 0.10,
        }
    }
}

/// ROE pass over the most recent fiscal years.
#[derive(Debug, Clone, Copy)]
pub struct RoeFilter {
    config: RoeConfig,
    year_floor: f64,
}

impl RoeFilter {
    /// Combine the configured thresholds with the caller's `minROE` fraction.
    ///
    /// Every year must clear the higher of the two.
    #[must_use]
    pub fn new(config: RoeConfig, min_roe: Option<f64>) -> Self {
        let year_floor = min_roe.map_or(config.min_each_year, |m| m.max(config.min_each_year));
        Self { config, year_floor }
    }

    /// Per-year floor in effect.
    #[must_use]
    pub const fn year_floor(&self) -> f64 {
        self.year_floor
    }

    /// Check an ROE history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] describing the first threshold missed.
    pub fn check(&self, roe: &Series) -> Result<(), Rejection> {
        let recent = roe.recent(self.config.years);
        if recent.len() < self.config.years || recent.is_empty() {
            return Err(Rejection::RoeHistory {
                years: recent.len(),
            });
        }
        let average = mean(&recent).unwrap_or(f64::NEG_INFINITY);
        if average < self.config.min_average {
            return Err(Rejection::RoeAverage { average });
        }
        let lowest = recent.iter().copied().fold(f64::INFINITY, f64::min);
        if lowest < self.year_floor {
            return Err(Rejection::RoeYear { lowest });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(edit: impl FnOnce(&mut CompanyProfile)) -> CompanyProfile {
        let mut p = CompanyProfile {
            symbol: "FLT".to_string(),
            name: "Filter Co".to_string(),
            sector: "Technology".to_string(),
            industry: "Software".to_string(),
            price: Some(12.0),
            market_cap: Some(5e9),
            is_etf: false,
            is_actively_trading: true,
        };
        edit(&mut p);
        p
    }

    #[test]
    fn test_profile_pass() {
        let criteria = ScreeningCriteria {
            min_market_cap: Some(1e9),
            exclude_sectors: vec!["Energy".to_string()],
            ..Default::default()
        };
        let filter = CoarseFilter::new(&criteria);
        assert!(filter.check(&profile(|_| {})).is_ok());
        assert_eq!(filter.check(&profile(|p| p.is_etf = true)), Err(Rejection::Etf));
        assert_eq!(filter.check(&profile(|p| p.price = Some(0.0))), Err(Rejection::NoPrice));
        assert_eq!(filter.check(&profile(|p| p.price = None)), Err(Rejection::NoPrice));
        assert_eq!(
            filter.check(&profile(|p| p.market_cap = Some(5e8))),
            Err(Rejection::MarketCap)
        );
        assert_eq!(filter.check(&profile(|p| p.market_cap = None)), Err(Rejection::MarketCap));
        assert_eq!(
            filter.check(&profile(|p| p.sector = "energy".to_string())),
            Err(Rejection::Sector)
        );
        assert_eq!(
            filter.check(&profile(|p| p.is_actively_trading = false)),
            Err(Rejection::NotTrading)
        );
    }

    #[test]
    fn test_roe_pass() {
        let filter = RoeFilter::new(RoeConfig::default(), None);
        assert!(filter.check(&Series::from_values(&[0.05, 0.16, 0.18, 0.2])).is_ok());
        assert_eq!(
            filter.check(&Series::from_values(&[0.3, 0.3])),
            Err(Rejection::RoeHistory { years: 2 })
        );
        assert!(matches!(
            filter.check(&Series::from_values(&[0.12, 0.12, 0.13])),
            Err(Rejection::RoeAverage { .. })
        ));
        assert!(matches!(
            filter.check(&Series::from_values(&[0.3, 0.09, 0.3])),
            Err(Rejection::RoeYear { .. })
        ));
    }

    #[test]
    fn test_roe_gaps_reduce_history() {
        let filter = RoeFilter::new(RoeConfig::default(), None);
        let gappy = Series::new(vec![Some(0.2), None, Some(0.2), None]);
        assert_eq!(filter.check(&gappy), Err(Rejection::RoeHistory { years: 2 }));
    }

    #[test]
    fn test_min_roe_raises_year_floor() {
        let filter = RoeFilter::new(RoeConfig::default(), Some(0.17));
        assert!((filter.year_floor() - 0.17).abs() < 1e-12);
        assert!(matches!(
            filter.check(&Series::from_values(&[0.16, 0.2, 0.2])),
            Err(Rejection::RoeYear { .. })
        ));
        // A lower minROE never relaxes the configured floor.
        let lenient = RoeFilter::new(RoeConfig::default(), Some(0.02));
        assert!((lenient.year_floor() - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rejection::RoeAverage { average: 0.125 }.to_string(), "average ROE 12.5%");
        assert_eq!(Rejection::Etf.to_string(), "etf");
    }
}
