//! Shared identifier types.

/// Ticker symbol, e.g. `"AAPL"`.
pub type Symbol = String;

/// Fiscal year label, e.g. `2024`.
pub type FiscalYear = i32;
