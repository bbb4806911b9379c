//! Endpoint catalogue and cache ttl policy.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// FMP endpoints used by the screener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Every listed symbol.
    StockList,
    /// Company profiles, batched by comma-separated symbol.
    Profile,
    /// Income statements.
    IncomeStatement,
    /// Balance sheets.
    BalanceSheet,
    /// Cash flow statements.
    CashFlow,
    /// Annual financial ratios.
    Ratios,
    /// Trailing-twelve-month ratios.
    RatiosTtm,
    /// Key metrics.
    KeyMetrics,
    /// Insider transactions.
    InsiderTrading,
    /// Reported earnings with estimates.
    Earnings,
    /// Social sentiment (bullish or bearish slice).
    SocialSentiment,
}

impl Endpoint {
    /// Path relative to the API base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::StockList => "stock-list",
            Self::Profile => "profile",
            Self::IncomeStatement => "income-statement",
            Self::BalanceSheet => "balance-sheet-statement",
            Self::CashFlow => "cash-flow-statement",
            Self::Ratios => "ratios",
            Self::RatiosTtm => "ratios-ttm",
            Self::KeyMetrics => "key-metrics",
            Self::InsiderTrading => "insider-trading/search",
            Self::Earnings => "earnings",
            Self::SocialSentiment => "social-sentiments/trending",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Cache lifetime per endpoint kind, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    /// Stock list and profiles.
    pub profile_secs: u64,
    /// Statements, ratios and key metrics.
    pub statements_secs: u64,
    /// Insider transactions.
    pub insider_secs: u64,
    /// Earnings surprises.
    pub earnings_secs: u64,
    /// Social sentiment.
    pub sentiment_secs: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            profile_secs: 24 * 60 * 60,
            statements_secs: 60 * 60,
            insider_secs: 60 * 60,
            earnings_secs: 15 * 60,
            sentiment_secs: 15 * 60,
        }
    }
}

impl TtlPolicy {
    /// Cache lifetime for responses from `endpoint`.
    #[must_use]
    pub const fn ttl_for(&self, endpoint: Endpoint) -> Duration {
        let secs = match endpoint {
            Endpoint::StockList | Endpoint::Profile => self.profile_secs,
            Endpoint::IncomeStatement
            | Endpoint::BalanceSheet
            | Endpoint::CashFlow
            | Endpoint::Ratios
            | Endpoint::RatiosTtm
            | Endpoint::KeyMetrics => self.statements_secs,
            Endpoint::InsiderTrading => self.insider_secs,
            Endpoint::Earnings => self.earnings_secs,
            Endpoint::SocialSentiment => self.sentiment_secs,
        };
        Duration::from_secs(secs)
    }
}
