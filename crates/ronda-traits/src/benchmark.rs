//! Per-sector growth targets and valuation ceilings.
//!
//! Analyzers score an entity against the benchmark of its own sector, so a
//! 6% revenue CAGR reads very differently for a utility than for a software
//! company. Unknown sectors fall back to [`SectorBenchmark::DEFAULT`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Targets and ceilings for one sector. Growth and margin values are fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorBenchmark {
    /// Target revenue CAGR.
    pub revenue_growth: f64,
    /// Target EPS CAGR.
    pub eps_growth: f64,
    /// Target free cash flow CAGR.
    pub fcf_growth: f64,
    /// Typical return on equity.
    pub roe: f64,
    /// Typical operating margin.
    pub operating_margin: f64,
    /// P/E at which the P/E score reaches zero.
    pub pe_max: f64,
    /// P/B at which the P/B score reaches zero.
    pub pb_max: f64,
    /// Debt-to-equity at which the leverage score reaches zero.
    pub debt_to_equity_max: f64,
}

impl SectorBenchmark {
    /// Fallback for sectors without an entry.
    pub const DEFAULT: Self = Self::of(0.10, 0.08, 0.06, 0.10, 0.12, 20.0, 3.0, 2.0);

    #[allow(clippy::too_many_arguments)]
    const fn of(
        revenue_growth: f64,
        eps_growth: f64,
        fcf_growth: f64,
        roe: f64,
        operating_margin: f64,
        pe_max: f64,
        pb_max: f64,
        debt_to_equity_max: f64,
    ) -> Self {
        Self {
            revenue_growth,
            eps_growth,
            fcf_growth,
            roe,
            operating_margin,
            pe_max,
            pb_max,
            debt_to_equity_max,
        }
    }
}

impl Default for SectorBenchmark {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Lookup table of sector benchmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorBenchmarks {
    sectors: BTreeMap<String, SectorBenchmark>,
    fallback: SectorBenchmark,
}

impl SectorBenchmarks {
    /// Create an empty table that answers every lookup with `fallback`.
    #[must_use]
    pub const fn empty(fallback: SectorBenchmark) -> Self {
        Self {
            sectors: BTreeMap::new(),
            fallback,
        }
    }

    /// Insert or replace the benchmark for `sector`.
    pub fn insert(&mut self, sector: impl Into<String>, benchmark: SectorBenchmark) {
        self.sectors.insert(sector.into(), benchmark);
    }

    /// Replace the fallback benchmark.
    pub const fn set_fallback(&mut self, fallback: SectorBenchmark) {
        self.fallback = fallback;
    }

    /// Benchmark for `sector`, case-insensitive, or the fallback.
    #[must_use]
    pub fn for_sector(&self, sector: &str) -> &SectorBenchmark {
        self.sectors
            .get(sector)
            .or_else(|| {
                self.sectors
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(sector))
                    .map(|(_, b)| b)
            })
            .unwrap_or(&self.fallback)
    }

    /// Sectors with an explicit entry.
    pub fn sectors(&self) -> impl Iterator<Item = &str> {
        self.sectors.keys().map(String::as_str)
    }
}

impl Default for SectorBenchmarks {
    fn default() -> Self {
        let mut table = Self::empty(SectorBenchmark::DEFAULT);
        let rows = [
            ("Technology", SectorBenchmark::of(0.15, 0.12, 0.10, 0.15, 0.15, 30.0, 5.0, 1.5)),
            ("Consumer Cyclical", SectorBenchmark::of(0.10, 0.10, 0.08, 0.12, 0.10, 25.0, 4.0, 2.0)),
            ("Healthcare", SectorBenchmark::of(0.08, 0.10, 0.08, 0.13, 0.12, 28.0, 4.5, 1.2)),
            ("Financial Services", SectorBenchmark::of(0.06, 0.08, 0.06, 0.10, 0.25, 20.0, 2.0, 5.0)),
            ("Communication Services", SectorBenchmark::of(0.08, 0.10, 0.08, 0.12, 0.15, 25.0, 3.5, 2.0)),
            ("Industrials", SectorBenchmark::of(0.07, 0.08, 0.07, 0.11, 0.12, 22.0, 3.0, 2.0)),
            ("Basic Materials", SectorBenchmark::of(0.06, 0.07, 0.06, 0.10, 0.10, 18.0, 2.5, 1.8)),
            ("Energy", SectorBenchmark::of(0.05, 0.06, 0.05, 0.09, 0.08, 16.0, 2.0, 2.5)),
            ("Utilities", SectorBenchmark::of(0.04, 0.05, 0.03, 0.08, 0.15, 20.0, 2.0, 2.0)),
            ("Real Estate", SectorBenchmark::of(0.05, 0.06, 0.04, 0.09, 0.35, 22.0, 2.5, 3.0)),
            ("Consumer Defensive", SectorBenchmark::of(0.05, 0.06, 0.05, 0.10, 0.12, 22.0, 3.5, 1.5)),
        ];
        for (sector, benchmark) in rows {
            table.insert(sector, benchmark);
        }
        table
    }
}
