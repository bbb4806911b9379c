//! Per-entity financial records.
//!
//! A [`FinancialRecord`] is assembled once per screening run from several
//! provider endpoints and handed to every analyzer. Multi-year values are held
//! in [`Series`], ordered oldest first with one slot per fiscal year so a
//! missing year stays visible as a gap instead of shifting later years.

use serde::{Deserialize, Serialize};

use crate::{FiscalYear, Symbol};

/// A fiscal-year time series, oldest first. Missing years are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(Vec<Option<f64>>);

impl Series {
    /// Create a series from raw slots. Non-finite values become gaps.
    #[must_use]
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(
            values
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect(),
        )
    }

    /// Create a gap-free series.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(Some).collect())
    }

    /// Number of fiscal-year slots, including gaps.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the series has no slots at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw slots.
    #[must_use]
    pub fn slots(&self) -> &[Option<f64>] {
        &self.0
    }

    /// Most recent present value.
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        self.0.iter().rev().find_map(|v| *v)
    }

    /// Present values in chronological order.
    #[must_use]
    pub fn present(&self) -> Vec<f64> {
        self.0.iter().filter_map(|v| *v).collect()
    }

    /// The last `n` present values in chronological order.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<f64> {
        let present = self.present();
        let skip = present.len().saturating_sub(n);
        present[skip..].to_vec()
    }

    /// First and last present values plus the number of years between them.
    ///
    /// Returns `None` when fewer than two years are present.
    #[must_use]
    pub fn endpoints(&self) -> Option<(f64, f64, usize)> {
        let first = self.0.iter().position(Option::is_some)?;
        let last = self.0.iter().rposition(Option::is_some)?;
        if last <= first {
            return None;
        }
        Some((self.0[first]?, self.0[last]?, last - first))
    }

    /// Year-over-year growth rates between adjacent present years.
    ///
    /// Pairs straddling a gap, or with a non-positive base, are skipped.
    #[must_use]
    pub fn yoy_growth(&self) -> Vec<f64> {
        self.0
            .windows(2)
            .filter_map(|pair| match (pair[0], pair[1]) {
                (Some(prev), Some(cur)) if prev > 0.0 => Some((cur - prev) / prev),
                _ => None,
            })
            .collect()
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self::from_values(&values)
    }
}

/// Lightweight identity and pricing data used by the coarse filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Company name.
    pub name: String,
    /// Sector classification (e.g. "Technology").
    pub sector: String,
    /// Industry classification.
    pub industry: String,
    /// Last price, when the provider reported one.
    pub price: Option<f64>,
    /// Market capitalization, when the provider reported one.
    pub market_cap: Option<f64>,
    /// Whether the instrument is an ETF.
    pub is_etf: bool,
    /// Whether the instrument is actively trading.
    pub is_actively_trading: bool,
}

/// Aggregated insider transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InsiderActivity {
    /// Number of purchase transactions.
    pub buy_count: u32,
    /// Number of sale transactions.
    pub sell_count: u32,
    /// Total value purchased.
    pub buy_value: f64,
    /// Total value sold.
    pub sell_value: f64,
}

impl InsiderActivity {
    /// Buy count relative to sell count (sells floored at one).
    #[must_use]
    pub fn buy_sell_ratio(&self) -> f64 {
        f64::from(self.buy_count) / f64::from(self.sell_count.max(1))
    }

    /// Insiders bought, and bought at least half as often as they sold.
    #[must_use]
    pub fn significant_buying(&self) -> bool {
        self.buy_count > 0 && self.buy_sell_ratio() >= 0.5
    }

    /// Whether any transaction was seen.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buy_count == 0 && self.sell_count == 0
    }
}

/// Most recent earnings surprise, as fractions of the estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsSurprise {
    /// (actual - estimate) / |estimate| for EPS.
    pub eps_surprise: Option<f64>,
    /// (actual - estimate) / |estimate| for revenue.
    pub revenue_surprise: Option<f64>,
}

/// Social media sentiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialSentiment {
    /// Share of bullish posts in [0, 1].
    pub bullish_ratio: Option<f64>,
    /// Change of the bullish share against the prior window, in percentage points.
    pub change_pct_points: Option<f64>,
}

/// Complete per-entity financial record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    /// Identity and pricing.
    pub profile: CompanyProfile,
    /// Current price.
    pub price: f64,
    /// Current market capitalization.
    pub market_cap: f64,
    /// Fiscal year labels matching the series slots, oldest first.
    pub fiscal_years: Vec<FiscalYear>,
    /// Total revenue.
    pub revenue: Series,
    /// Earnings per share.
    pub eps: Series,
    /// Free cash flow.
    pub free_cash_flow: Series,
    /// Total debt.
    pub total_debt: Series,
    /// Total stockholders' equity.
    pub total_equity: Series,
    /// Operating cash flow.
    pub operating_cash_flow: Series,
    /// Net income.
    pub net_income: Series,
    /// Gross margin (fraction).
    pub gross_margin: Series,
    /// Operating margin (fraction).
    pub operating_margin: Series,
    /// Current assets minus current liabilities.
    pub working_capital: Series,
    /// Research and development expense.
    pub rd_expense: Series,
    /// Capital expenditure, as a positive amount.
    pub capex: Series,
    /// Return on equity (fraction).
    pub roe: Series,
    /// Operating income over interest expense. Gap when there is no interest expense.
    pub interest_coverage: Series,
    /// Total debt over EBITDA. Gap when EBITDA is not positive.
    pub debt_to_ebitda: Series,
    /// Trailing P/E ratio.
    pub pe_ratio: Option<f64>,
    /// Trailing P/B ratio.
    pub pb_ratio: Option<f64>,
    /// Insider trading summary.
    pub insider: Option<InsiderActivity>,
    /// Latest earnings surprise.
    pub earnings: Option<EarningsSurprise>,
    /// Social sentiment snapshot.
    pub social: Option<SocialSentiment>,
}

impl FinancialRecord {
    /// Create a record with identity and pricing only; every series is empty.
    #[must_use]
    pub fn new(profile: CompanyProfile, price: f64, market_cap: f64) -> Self {
        Self {
            profile,
            price,
            market_cap,
            fiscal_years: Vec::new(),
            revenue: Series::default(),
            eps: Series::default(),
            free_cash_flow: Series::default(),
            total_debt: Series::default(),
            total_equity: Series::default(),
            operating_cash_flow: Series::default(),
            net_income: Series::default(),
            gross_margin: Series::default(),
            operating_margin: Series::default(),
            working_capital: Series::default(),
            rd_expense: Series::default(),
            capex: Series::default(),
            roe: Series::default(),
            interest_coverage: Series::default(),
            debt_to_ebitda: Series::default(),
            pe_ratio: None,
            pb_ratio: None,
            insider: None,
            earnings: None,
            social: None,
        }
    }

    /// Ticker symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.profile.symbol
    }

    /// Sector classification.
    #[must_use]
    pub fn sector(&self) -> &str {
        &self.profile.sector
    }

    /// Debt-to-equity for the latest year reporting both debt and equity.
    ///
    /// Zero debt yields `0.0`, even without a matching equity figure. Debt
    /// against non-positive equity yields infinity.
    #[must_use]
    pub fn debt_to_equity(&self) -> Option<f64> {
        let paired = self
            .total_debt
            .slots()
            .iter()
            .zip(self.total_equity.slots())
            .rev()
            .find_map(|(debt, equity)| Some(((*debt)?, (*equity)?)));
        match paired {
            Some((debt, _)) if debt <= 0.0 => Some(0.0),
            Some((debt, equity)) if equity > 0.0 => Some(debt / equity),
            Some(_) => Some(f64::INFINITY),
            None => self.total_debt.latest().filter(|debt| *debt <= 0.0).map(|_| 0.0),
        }
    }

    /// Latest operating cash flow over net income. `None` when net income is not positive.
    #[must_use]
    pub fn ocf_to_net_income(&self) -> Option<f64> {
        let net_income = self.net_income.latest()?;
        if net_income <= 0.0 {
            return None;
        }
        self.operating_cash_flow.latest().map(|ocf| ocf / net_income)
    }
}
