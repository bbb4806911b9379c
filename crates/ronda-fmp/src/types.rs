//! Data types for FMP API responses.
//!
//! Numeric fields are `Option<f64>`: FMP sends `null` for values it does not
//! have, and a gap must stay distinguishable from a reported zero.

use chrono::NaiveDate;
use ronda_traits::{CompanyProfile, FiscalYear};
use serde::{Deserialize, Serialize};

/// Reporting period for financial statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    /// Annual reports (10-K filings).
    #[default]
    Annual,
    /// Quarterly reports (10-Q filings).
    Quarter,
}

impl Period {
    /// Get the API parameter value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarter => "quarter",
        }
    }
}

/// Which slice of social sentiment to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentKind {
    /// Share of bullish posts.
    Bullish,
    /// Share of bearish posts.
    Bearish,
}

impl SentimentKind {
    /// Get the API parameter value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
        }
    }
}

/// Fiscal year of a statement: the reported year, else the year of its date.
fn statement_year(fiscal_year: Option<&str>, date: &str) -> Option<FiscalYear> {
    fiscal_year
        .and_then(|y| y.trim().parse().ok())
        .or_else(|| date.get(..4).and_then(|y| y.parse().ok()))
}

/// One row of the stock list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockListEntry {
    /// Ticker symbol.
    pub symbol: String,
    /// Company name.
    #[serde(default, alias = "companyName")]
    pub name: Option<String>,
    /// Exchange short name, e.g. `NASDAQ`.
    #[serde(default, alias = "exchangeShortName")]
    pub exchange: Option<String>,
    /// Instrument type, e.g. `stock` or `etf`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl StockListEntry {
    /// Whether this row is an equity listed on `exchange`.
    ///
    /// Rows without exchange or type information are kept; the profile
    /// pass filters them later.
    #[must_use]
    pub fn is_equity_on(&self, exchange: &str) -> bool {
        let on_exchange = self
            .exchange
            .as_deref()
            .is_none_or(|e| e.eq_ignore_ascii_case(exchange));
        let is_stock = self
            .kind
            .as_deref()
            .is_none_or(|k| k.eq_ignore_ascii_case("stock"));
        on_exchange && is_stock && !self.symbol.trim().is_empty()
    }
}

/// Company profile from FMP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    /// Ticker symbol.
    pub symbol: String,
    /// Company name.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Sector.
    #[serde(default)]
    pub sector: Option<String>,
    /// Industry.
    #[serde(default)]
    pub industry: Option<String>,
    /// Last price.
    #[serde(default)]
    pub price: Option<f64>,
    /// Market capitalization.
    #[serde(default, alias = "mktCap")]
    pub market_cap: Option<f64>,
    /// ETF flag.
    #[serde(default)]
    pub is_etf: bool,
    /// Actively trading flag.
    #[serde(default = "default_true")]
    pub is_actively_trading: bool,
    /// Exchange short name.
    #[serde(default, alias = "exchangeShortName")]
    pub exchange: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl From<ProfilePayload> for CompanyProfile {
    fn from(p: ProfilePayload) -> Self {
        Self {
            name: p.company_name.unwrap_or_else(|| p.symbol.clone()),
            symbol: p.symbol,
            sector: p.sector.unwrap_or_default(),
            industry: p.industry.unwrap_or_default(),
            price: p.price.filter(|v| v.is_finite()),
            market_cap: p.market_cap.filter(|v| v.is_finite()),
            is_etf: p.is_etf,
            is_actively_trading: p.is_actively_trading,
        }
    }
}

/// Income statement data from FMP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    /// Period end date.
    pub date: String,
    /// Ticker symbol.
    #[serde(default)]
    pub symbol: String,
    /// Fiscal year label.
    #[serde(default, alias = "calendarYear")]
    pub fiscal_year: Option<String>,
    /// Total revenue.
    #[serde(default)]
    pub revenue: Option<f64>,
    /// Gross profit.
    #[serde(default)]
    pub gross_profit: Option<f64>,
    /// Research and development expenses.
    #[serde(default)]
    pub research_and_development_expenses: Option<f64>,
    /// Operating income.
    #[serde(default)]
    pub operating_income: Option<f64>,
    /// Interest expense.
    #[serde(default)]
    pub interest_expense: Option<f64>,
    /// EBITDA.
    #[serde(default)]
    pub ebitda: Option<f64>,
    /// Net income.
    #[serde(default)]
    pub net_income: Option<f64>,
    /// Earnings per share (basic).
    #[serde(default)]
    pub eps: Option<f64>,
    /// Earnings per share (diluted).
    #[serde(default, alias = "epsdiluted")]
    pub eps_diluted: Option<f64>,
}

impl IncomeStatement {
    /// Fiscal year of the statement.
    #[must_use]
    pub fn year(&self) -> Option<FiscalYear> {
        statement_year(self.fiscal_year.as_deref(), &self.date)
    }

    /// Gross profit over revenue.
    #[must_use]
    pub fn gross_margin(&self) -> Option<f64> {
        match (self.gross_profit, self.revenue) {
            (Some(gp), Some(rev)) if rev > 0.0 => Some(gp / rev),
            _ => None,
        }
    }

    /// Operating income over revenue.
    #[must_use]
    pub fn operating_margin(&self) -> Option<f64> {
        match (self.operating_income, self.revenue) {
            (Some(oi), Some(rev)) if rev > 0.0 => Some(oi / rev),
            _ => None,
        }
    }

    /// Operating income over interest expense. `None` without interest expense.
    #[must_use]
    pub fn interest_coverage(&self) -> Option<f64> {
        match (self.operating_income, self.interest_expense) {
            (Some(oi), Some(ie)) if ie.abs() > 0.0 => Some(oi / ie.abs()),
            _ => None,
        }
    }
}

/// Balance sheet data from FMP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    /// Period end date.
    pub date: String,
    /// Ticker symbol.
    #[serde(default)]
    pub symbol: String,
    /// Fiscal year label.
    #[serde(default, alias = "calendarYear")]
    pub fiscal_year: Option<String>,
    /// Total current assets.
    #[serde(default)]
    pub total_current_assets: Option<f64>,
    /// Total current liabilities.
    #[serde(default)]
    pub total_current_liabilities: Option<f64>,
    /// Total debt.
    #[serde(default)]
    pub total_debt: Option<f64>,
    /// Total stockholders' equity.
    #[serde(default)]
    pub total_stockholders_equity: Option<f64>,
    /// Total equity (including non-controlling interests).
    #[serde(default)]
    pub total_equity: Option<f64>,
}

impl BalanceSheet {
    /// Fiscal year of the statement.
    #[must_use]
    pub fn year(&self) -> Option<FiscalYear> {
        statement_year(self.fiscal_year.as_deref(), &self.date)
    }

    /// Stockholders' equity, falling back to total equity.
    #[must_use]
    pub fn equity(&self) -> Option<f64> {
        self.total_stockholders_equity.or(self.total_equity)
    }

    /// Current assets minus current liabilities.
    #[must_use]
    pub fn working_capital(&self) -> Option<f64> {
        Some(self.total_current_assets? - self.total_current_liabilities?)
    }
}

/// Cash flow statement data from FMP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowStatement {
    /// Period end date.
    pub date: String,
    /// Ticker symbol.
    #[serde(default)]
    pub symbol: String,
    /// Fiscal year label.
    #[serde(default, alias = "calendarYear")]
    pub fiscal_year: Option<String>,
    /// Operating cash flow.
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    /// Capital expenditure (reported negative).
    #[serde(default)]
    pub capital_expenditure: Option<f64>,
    /// Free cash flow.
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
}

impl CashFlowStatement {
    /// Fiscal year of the statement.
    #[must_use]
    pub fn year(&self) -> Option<FiscalYear> {
        statement_year(self.fiscal_year.as_deref(), &self.date)
    }

    /// Free cash flow, derived from OCF and capex when not reported.
    #[must_use]
    pub fn fcf(&self) -> Option<f64> {
        self.free_cash_flow.or_else(|| {
            Some(self.operating_cash_flow? - self.capital_expenditure?.abs())
        })
    }
}

/// Annual financial ratios from FMP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRatios {
    /// Period end date.
    pub date: String,
    /// Ticker symbol.
    #[serde(default)]
    pub symbol: String,
    /// Fiscal year label.
    #[serde(default, alias = "calendarYear")]
    pub fiscal_year: Option<String>,
    /// Gross profit margin.
    #[serde(default)]
    pub gross_profit_margin: Option<f64>,
    /// Operating profit margin.
    #[serde(default)]
    pub operating_profit_margin: Option<f64>,
    /// Return on equity.
    #[serde(default)]
    pub return_on_equity: Option<f64>,
    /// Interest coverage.
    #[serde(default, alias = "interestCoverageRatio")]
    pub interest_coverage: Option<f64>,
    /// Debt to equity.
    #[serde(default, alias = "debtToEquityRatio")]
    pub debt_equity_ratio: Option<f64>,
    /// Price to earnings.
    #[serde(default, alias = "priceToEarningsRatio")]
    pub price_earnings_ratio: Option<f64>,
    /// Price to book.
    #[serde(default)]
    pub price_to_book_ratio: Option<f64>,
}

impl FinancialRatios {
    /// Fiscal year of the ratios.
    #[must_use]
    pub fn year(&self) -> Option<FiscalYear> {
        statement_year(self.fiscal_year.as_deref(), &self.date)
    }

    /// Parse the date string into a `NaiveDate`.
    #[must_use]
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// Trailing-twelve-month ratios from FMP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatiosTtm {
    /// Trailing P/E.
    #[serde(default, rename = "peRatioTTM", alias = "priceToEarningsRatioTTM")]
    pub pe_ratio_ttm: Option<f64>,
    /// Trailing P/B.
    #[serde(default, rename = "priceToBookRatioTTM")]
    pub price_to_book_ratio_ttm: Option<f64>,
    /// Trailing ROE.
    #[serde(default, rename = "returnOnEquityTTM")]
    pub return_on_equity_ttm: Option<f64>,
}

/// Key financial metrics from FMP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    /// Period end date.
    pub date: String,
    /// Ticker symbol.
    #[serde(default)]
    pub symbol: String,
    /// Fiscal year label.
    #[serde(default, alias = "calendarYear")]
    pub fiscal_year: Option<String>,
    /// Market capitalization.
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Return on equity.
    #[serde(default, alias = "roe")]
    pub return_on_equity: Option<f64>,
    /// Price to earnings.
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    /// Price to book.
    #[serde(default)]
    pub pb_ratio: Option<f64>,
    /// Free cash flow yield.
    #[serde(default)]
    pub free_cash_flow_yield: Option<f64>,
}

impl KeyMetrics {
    /// Fiscal year of the metrics.
    #[must_use]
    pub fn year(&self) -> Option<FiscalYear> {
        statement_year(self.fiscal_year.as_deref(), &self.date)
    }
}

/// One insider transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderTrade {
    /// Transaction date.
    #[serde(default)]
    pub transaction_date: Option<String>,
    /// Transaction code, e.g. `P-Purchase` or `S-Sale`.
    #[serde(default)]
    pub transaction_type: String,
    /// Number of shares.
    #[serde(default)]
    pub securities_transacted: Option<f64>,
    /// Price per share.
    #[serde(default)]
    pub price: Option<f64>,
}

impl InsiderTrade {
    /// Open-market purchase or buy.
    #[must_use]
    pub fn is_buy(&self) -> bool {
        self.transaction_type.starts_with(['P', 'B'])
    }

    /// Sale.
    #[must_use]
    pub fn is_sell(&self) -> bool {
        self.transaction_type.starts_with('S')
    }

    /// Shares times price, zero when either is missing.
    #[must_use]
    pub fn value(&self) -> f64 {
        let v = self.securities_transacted.unwrap_or(0.0) * self.price.unwrap_or(0.0);
        if v.is_finite() { v.abs() } else { 0.0 }
    }
}

/// One reported (or upcoming) earnings event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsReport {
    /// Report date.
    pub date: String,
    /// Reported EPS.
    #[serde(default)]
    pub eps_actual: Option<f64>,
    /// Consensus EPS.
    #[serde(default)]
    pub eps_estimated: Option<f64>,
    /// Reported revenue.
    #[serde(default)]
    pub revenue_actual: Option<f64>,
    /// Consensus revenue.
    #[serde(default)]
    pub revenue_estimated: Option<f64>,
}

/// One social sentiment reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSentimentEntry {
    /// Ticker symbol.
    #[serde(default)]
    pub symbol: String,
    /// Current share of posts, in percent.
    #[serde(default)]
    pub sentiment: Option<f64>,
    /// Share in the previous window, in percent.
    #[serde(default)]
    pub last_sentiment: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_accepts_legacy_market_cap() {
        let json = r#"{"symbol":"AAPL","companyName":"Apple Inc.","sector":"Technology",
            "industry":"Consumer Electronics","price":190.5,"mktCap":2.9e12,"isEtf":false}"#;
        let payload: ProfilePayload = serde_json::from_str(json).unwrap();
        let profile = CompanyProfile::from(payload);
        assert_eq!(profile.market_cap, Some(2.9e12));
        assert_eq!(profile.sector, "Technology");
        assert!(profile.is_actively_trading);
    }

    #[test]
    fn test_nulls_are_gaps() {
        let json = r#"{"date":"2023-09-30","symbol":"AAPL","revenue":null,"eps":6.13}"#;
        let stmt: IncomeStatement = serde_json::from_str(json).unwrap();
        assert!(stmt.revenue.is_none());
        assert_eq!(stmt.eps, Some(6.13));
        assert_eq!(stmt.year(), Some(2023));
    }

    #[test]
    fn test_fiscal_year_preferred_over_date() {
        let json = r#"{"date":"2024-01-31","fiscalYear":"2023"}"#;
        let stmt: BalanceSheet = serde_json::from_str(json).unwrap();
        assert_eq!(stmt.year(), Some(2023));
    }

    #[test]
    fn test_stock_list_filter() {
        let entry = |exchange: Option<&str>, kind: Option<&str>| StockListEntry {
            symbol: "ABC".to_string(),
            name: None,
            exchange: exchange.map(str::to_string),
            kind: kind.map(str::to_string),
        };
        assert!(entry(Some("NASDAQ"), Some("stock")).is_equity_on("nasdaq"));
        assert!(entry(None, None).is_equity_on("NASDAQ"));
        assert!(!entry(Some("NYSE"), Some("stock")).is_equity_on("NASDAQ"));
        assert!(!entry(Some("NASDAQ"), Some("etf")).is_equity_on("NASDAQ"));
    }

    #[test]
    fn test_insider_classification() {
        let trade = |t: &str| InsiderTrade {
            transaction_date: None,
            transaction_type: t.to_string(),
            securities_transacted: Some(100.0),
            price: Some(10.0),
        };
        assert!(trade("P-Purchase").is_buy());
        assert!(trade("S-Sale").is_sell());
        assert!(!trade("M-Exempt").is_buy() && !trade("M-Exempt").is_sell());
        assert!((trade("P-Purchase").value() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_derived_metrics() {
        let cf = CashFlowStatement {
            date: "2023-12-31".to_string(),
            symbol: "X".to_string(),
            fiscal_year: None,
            operating_cash_flow: Some(100.0),
            capital_expenditure: Some(-30.0),
            free_cash_flow: None,
        };
        assert_eq!(cf.fcf(), Some(70.0));

        let income: IncomeStatement = serde_json::from_str(
            r#"{"date":"2023-12-31","operatingIncome":50.0,"interestExpense":10.0,"revenue":200.0,"grossProfit":80.0}"#,
        )
        .unwrap();
        assert_eq!(income.interest_coverage(), Some(5.0));
        assert_eq!(income.gross_margin(), Some(0.4));
        assert_eq!(income.operating_margin(), Some(0.25));
    }
}
