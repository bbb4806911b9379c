//! Assembly of provider payloads into a [`FinancialRecord`].
//!
//! Income statements are the backbone: every fiscal year from their first to
//! their last defines a series slot, and every other statement is matched to
//! them by year. A year missing from the income statements leaves a gap in
//! every series; a year missing from a secondary source leaves a gap in that
//! series only.

use std::collections::BTreeMap;

use ronda_traits::{
    CompanyProfile, EarningsSurprise, FinancialRecord, FiscalYear, InsiderActivity, Series,
    SocialSentiment,
};

use crate::{
    FmpError, Result,
    types::{
        BalanceSheet, CashFlowStatement, EarningsReport, FinancialRatios, IncomeStatement,
        InsiderTrade, KeyMetrics, RatiosTtm, SocialSentimentEntry,
    },
};

/// Everything fetched for one entity, before alignment.
///
/// Statements are required; the rest are optional enrichments.
#[derive(Debug, Clone, Default)]
pub struct RawFundamentals {
    /// Income statements, any order.
    pub income: Vec<IncomeStatement>,
    /// Balance sheets, any order.
    pub balance: Vec<BalanceSheet>,
    /// Cash flow statements, any order.
    pub cash_flow: Vec<CashFlowStatement>,
    /// Annual ratios, any order.
    pub ratios: Vec<FinancialRatios>,
    /// Annual key metrics, any order.
    pub key_metrics: Vec<KeyMetrics>,
    /// Trailing ratios.
    pub ratios_ttm: Option<RatiosTtm>,
    /// Insider transactions.
    pub insider: Option<Vec<InsiderTrade>>,
    /// Earnings reports.
    pub earnings: Option<Vec<EarningsReport>>,
    /// Bullish sentiment readings.
    pub bullish: Option<Vec<SocialSentimentEntry>>,
    /// Bearish sentiment readings.
    pub bearish: Option<Vec<SocialSentimentEntry>>,
}

/// Index rows by fiscal year, keeping the first row seen for each year.
fn by_year<T>(rows: &[T], year: impl Fn(&T) -> Option<FiscalYear>) -> BTreeMap<FiscalYear, &T> {
    let mut map = BTreeMap::new();
    for row in rows {
        if let Some(y) = year(row) {
            map.entry(y).or_insert(row);
        }
    }
    map
}

fn series<T>(
    years: &[FiscalYear],
    rows: &BTreeMap<FiscalYear, &T>,
    value: impl Fn(&T) -> Option<f64>,
) -> Series {
    Series::new(
        years
            .iter()
            .map(|y| rows.get(y).and_then(|row| value(*row)))
            .collect(),
    )
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

/// Build a record for `profile` from `raw`, keeping the last `history_years` years.
///
/// # Errors
///
/// [`FmpError::NoData`] without any dated income statement, and
/// [`FmpError::MissingField`] without a price or market capitalization.
pub fn assemble_record(
    profile: CompanyProfile,
    raw: &RawFundamentals,
    history_years: usize,
) -> Result<FinancialRecord> {
    let symbol = profile.symbol.clone();
    let income = by_year(&raw.income, IncomeStatement::year);
    let (Some(&first), Some(&last)) = (income.keys().next(), income.keys().next_back()) else {
        return Err(FmpError::NoData(symbol));
    };
    let keep = FiscalYear::try_from(history_years.max(1)).unwrap_or(FiscalYear::MAX);
    let start = first.max(last.saturating_sub(keep - 1));
    let years: Vec<FiscalYear> = (start..=last).collect();

    let balance = by_year(&raw.balance, BalanceSheet::year);
    let cash_flow = by_year(&raw.cash_flow, CashFlowStatement::year);
    let ratios = by_year(&raw.ratios, FinancialRatios::year);
    let metrics = by_year(&raw.key_metrics, KeyMetrics::year);

    let price = positive(profile.price).ok_or_else(|| FmpError::MissingField {
        symbol: symbol.clone(),
        field: "price",
    })?;
    let market_cap = positive(profile.market_cap)
        .or_else(|| positive(metrics.values().next_back().and_then(|m| m.market_cap)))
        .ok_or_else(|| FmpError::MissingField {
            symbol: symbol.clone(),
            field: "marketCap",
        })?;

    let mut record = FinancialRecord::new(profile, price, market_cap);

    record.revenue = series(&years, &income, |s| s.revenue);
    record.eps = series(&years, &income, |s| s.eps_diluted.or(s.eps));
    record.net_income = series(&years, &income, |s| s.net_income);
    record.rd_expense = series(&years, &income, |s| s.research_and_development_expenses);
    record.gross_margin = Series::new(
        years
            .iter()
            .map(|y| {
                ratios
                    .get(y)
                    .and_then(|r| r.gross_profit_margin)
                    .or_else(|| income.get(y).and_then(|s| s.gross_margin()))
            })
            .collect(),
    );
    record.operating_margin = Series::new(
        years
            .iter()
            .map(|y| {
                ratios
                    .get(y)
                    .and_then(|r| r.operating_profit_margin)
                    .or_else(|| income.get(y).and_then(|s| s.operating_margin()))
            })
            .collect(),
    );

    record.total_debt = series(&years, &balance, |b| b.total_debt);
    record.total_equity = series(&years, &balance, BalanceSheet::equity);
    record.working_capital = series(&years, &balance, BalanceSheet::working_capital);

    record.operating_cash_flow = series(&years, &cash_flow, |c| c.operating_cash_flow);
    record.free_cash_flow = series(&years, &cash_flow, CashFlowStatement::fcf);
    record.capex = series(&years, &cash_flow, |c| c.capital_expenditure.map(f64::abs));

    record.roe = Series::new(
        years
            .iter()
            .map(|y| {
                ratios
                    .get(y)
                    .and_then(|r| r.return_on_equity)
                    .or_else(|| metrics.get(y).and_then(|m| m.return_on_equity))
                    .or_else(|| {
                        let ni = income.get(y)?.net_income?;
                        let equity = positive(balance.get(y)?.equity())?;
                        Some(ni / equity)
                    })
            })
            .collect(),
    );
    record.interest_coverage = Series::new(
        years
            .iter()
            .map(|y| {
                ratios
                    .get(y)
                    .and_then(|r| r.interest_coverage)
                    .or_else(|| income.get(y).and_then(|s| s.interest_coverage()))
            })
            .collect(),
    );
    record.debt_to_ebitda = Series::new(
        years
            .iter()
            .map(|y| {
                let ebitda = positive(income.get(y)?.ebitda)?;
                let debt = balance.get(y)?.total_debt?;
                Some(debt.max(0.0) / ebitda)
            })
            .collect(),
    );

    record.pe_ratio = raw
        .ratios_ttm
        .as_ref()
        .and_then(|t| t.pe_ratio_ttm)
        .or_else(|| ratios.values().next_back().and_then(|r| r.price_earnings_ratio))
        .or_else(|| metrics.values().next_back().and_then(|m| m.pe_ratio))
        .or_else(|| positive(record.eps.latest()).map(|eps| price / eps))
        .filter(|v| v.is_finite());
    record.pb_ratio = raw
        .ratios_ttm
        .as_ref()
        .and_then(|t| t.price_to_book_ratio_ttm)
        .or_else(|| ratios.values().next_back().and_then(|r| r.price_to_book_ratio))
        .or_else(|| metrics.values().next_back().and_then(|m| m.pb_ratio))
        .filter(|v| v.is_finite());

    record.insider = raw.insider.as_deref().map(summarize_insider);
    record.earnings = raw.earnings.as_deref().and_then(latest_surprise);
    record.social = summarize_social(
        &record.profile.symbol,
        raw.bullish.as_deref(),
        raw.bearish.as_deref(),
    );
    record.fiscal_years = years;
    Ok(record)
}

/// Count and value insider buys and sells. Other transaction codes are ignored.
#[must_use]
pub fn summarize_insider(trades: &[InsiderTrade]) -> InsiderActivity {
    trades.iter().fold(InsiderActivity::default(), |mut acc, t| {
        if t.is_buy() {
            acc.buy_count += 1;
            acc.buy_value += t.value();
        } else if t.is_sell() {
            acc.sell_count += 1;
            acc.sell_value += t.value();
        }
        acc
    })
}

fn surprise(actual: Option<f64>, estimate: Option<f64>) -> Option<f64> {
    let (a, e) = (actual?, estimate?);
    if e == 0.0 {
        return Some(0.0);
    }
    Some((a - e) / e.abs())
}

/// Surprise of the most recent report that has both an actual and an estimate.
#[must_use]
pub fn latest_surprise(reports: &[EarningsReport]) -> Option<EarningsSurprise> {
    let mut reported: Vec<&EarningsReport> = reports
        .iter()
        .filter(|r| r.eps_actual.is_some() && r.eps_estimated.is_some())
        .collect();
    reported.sort_by(|a, b| b.date.cmp(&a.date));
    let latest = reported.first()?;
    Some(EarningsSurprise {
        eps_surprise: surprise(latest.eps_actual, latest.eps_estimated),
        revenue_surprise: surprise(latest.revenue_actual, latest.revenue_estimated),
    })
}

fn pick<'a>(
    symbol: &str,
    rows: Option<&'a [SocialSentimentEntry]>,
) -> Option<&'a SocialSentimentEntry> {
    let rows = rows?;
    rows.iter().find(|r| r.symbol.eq_ignore_ascii_case(symbol))
}

/// Bullish share and its change from the bullish and bearish readings.
///
/// `None` when neither reading carries a value.
#[must_use]
pub fn summarize_social(
    symbol: &str,
    bullish: Option<&[SocialSentimentEntry]>,
    bearish: Option<&[SocialSentimentEntry]>,
) -> Option<SocialSentiment> {
    let bull_row = pick(symbol, bullish);
    let bull = bull_row.and_then(|r| r.sentiment).unwrap_or(0.0).max(0.0);
    let bear = pick(symbol, bearish)
        .and_then(|r| r.sentiment)
        .unwrap_or(0.0)
        .max(0.0);
    if bull + bear <= 0.0 {
        return None;
    }
    let last_bull = bull_row.and_then(|r| r.last_sentiment).unwrap_or(0.0);
    let change = if last_bull > 0.0 { bull - last_bull } else { 0.0 };
    Some(SocialSentiment {
        bullish_ratio: Some(bull / (bull + bear)),
        change_pct_points: Some(change),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ronda_traits::stats::series_cagr;
    use serde_json::json;

    fn profile() -> CompanyProfile {
        CompanyProfile {
            symbol: "ACME".to_string(),
            name: "Acme Corp".to_string(),
            sector: "Technology".to_string(),
            industry: "Software".to_string(),
            price: Some(50.0),
            market_cap: Some(5.0e9),
            is_etf: false,
            is_actively_trading: true,
        }
    }

    fn raw() -> RawFundamentals {
        // Newest first, the way FMP returns statements; 2021 balance sheet missing.
        let income = json!([
            {"date":"2023-12-31","fiscalYear":"2023","revenue":150.0,"netIncome":30.0,"eps":3.0,"ebitda":50.0},
            {"date":"2022-12-31","fiscalYear":"2022","revenue":120.0,"netIncome":20.0,"eps":2.0,"ebitda":40.0},
            {"date":"2021-12-31","fiscalYear":"2021","revenue":100.0,"netIncome":10.0,"eps":1.0,"ebitda":30.0}
        ]);
        let balance = json!([
            {"date":"2023-12-31","totalDebt":100.0,"totalStockholdersEquity":200.0},
            {"date":"2022-12-31","totalDebt":80.0,"totalStockholdersEquity":160.0}
        ]);
        let cash_flow = json!([
            {"date":"2023-12-31","operatingCashFlow":40.0,"capitalExpenditure":-10.0,"freeCashFlow":30.0},
            {"date":"2022-12-31","operatingCashFlow":30.0,"capitalExpenditure":-10.0}
        ]);
        RawFundamentals {
            income: serde_json::from_value(income).unwrap(),
            balance: serde_json::from_value(balance).unwrap(),
            cash_flow: serde_json::from_value(cash_flow).unwrap(),
            ..RawFundamentals::default()
        }
    }

    #[test]
    fn test_years_align_oldest_first_with_gaps() {
        let record = assemble_record(profile(), &raw(), 5).unwrap();
        assert_eq!(record.fiscal_years, vec![2021, 2022, 2023]);
        assert_eq!(record.revenue.slots(), &[Some(100.0), Some(120.0), Some(150.0)]);
        assert_eq!(record.total_debt.slots(), &[None, Some(80.0), Some(100.0)]);
        assert_eq!(record.free_cash_flow.slots(), &[None, Some(20.0), Some(30.0)]);
        assert_eq!(record.capex.latest(), Some(10.0));
    }

    #[test]
    fn test_missing_income_year_keeps_its_slot() {
        let income = json!([
            {"date":"2023-12-31","revenue":146.41},
            {"date":"2020-12-31","revenue":110.0},
            {"date":"2019-12-31","revenue":100.0}
        ]);
        let raw = RawFundamentals {
            income: serde_json::from_value(income).unwrap(),
            ..RawFundamentals::default()
        };
        let record = assemble_record(profile(), &raw, 10).unwrap();
        assert_eq!(record.fiscal_years, vec![2019, 2020, 2021, 2022, 2023]);
        assert_eq!(
            record.revenue.slots(),
            &[Some(100.0), Some(110.0), None, None, Some(146.41)]
        );
        assert_relative_eq!(series_cagr(&record.revenue).unwrap(), 0.10, epsilon = 1e-9);

        let recent = assemble_record(profile(), &raw, 3).unwrap();
        assert_eq!(recent.fiscal_years, vec![2021, 2022, 2023]);
        assert_eq!(recent.revenue.present(), vec![146.41]);
    }

    #[test]
    fn test_history_is_truncated_to_recent_years() {
        let record = assemble_record(profile(), &raw(), 2).unwrap();
        assert_eq!(record.fiscal_years, vec![2022, 2023]);
        assert_eq!(record.eps.present(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_derived_fallbacks() {
        let record = assemble_record(profile(), &raw(), 5).unwrap();
        // ROE from net income over equity when no ratios were fetched.
        assert_relative_eq!(record.roe.latest().unwrap(), 0.15);
        assert_relative_eq!(record.debt_to_ebitda.latest().unwrap(), 2.0);
        // P/E from price over latest EPS.
        assert_relative_eq!(record.pe_ratio.unwrap(), 50.0 / 3.0);
        assert!(record.pb_ratio.is_none());
    }

    #[test]
    fn test_missing_statements_and_price() {
        let err = assemble_record(profile(), &RawFundamentals::default(), 5).unwrap_err();
        assert!(matches!(err, FmpError::NoData(_)));

        let mut no_price = profile();
        no_price.price = None;
        let err = assemble_record(no_price, &raw(), 5).unwrap_err();
        assert!(matches!(err, FmpError::MissingField { field: "price", .. }));
    }

    #[test]
    fn test_insider_summary() {
        let trades: Vec<InsiderTrade> = serde_json::from_value(json!([
            {"transactionType":"P-Purchase","securitiesTransacted":100.0,"price":10.0},
            {"transactionType":"S-Sale","securitiesTransacted":50.0,"price":12.0},
            {"transactionType":"S-Sale","securitiesTransacted":10.0,"price":12.0},
            {"transactionType":"M-Exempt","securitiesTransacted":500.0,"price":1.0}
        ]))
        .unwrap();
        let activity = summarize_insider(&trades);
        assert_eq!((activity.buy_count, activity.sell_count), (1, 2));
        assert_relative_eq!(activity.buy_value, 1000.0);
        assert_relative_eq!(activity.sell_value, 720.0);
        assert!(activity.significant_buying());
    }

    #[test]
    fn test_latest_surprise_skips_upcoming() {
        let reports: Vec<EarningsReport> = serde_json::from_value(json!([
            {"date":"2024-04-25","epsActual":null,"epsEstimated":1.5},
            {"date":"2024-01-25","epsActual":1.1,"epsEstimated":1.0,"revenueActual":95.0,"revenueEstimated":100.0},
            {"date":"2023-10-25","epsActual":0.5,"epsEstimated":1.0}
        ]))
        .unwrap();
        let s = latest_surprise(&reports).unwrap();
        assert_relative_eq!(s.eps_surprise.unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(s.revenue_surprise.unwrap(), -0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_estimate_is_no_surprise() {
        let reports: Vec<EarningsReport> =
            serde_json::from_value(json!([{"date":"2024-01-25","epsActual":0.2,"epsEstimated":0.0}]))
                .unwrap();
        assert_eq!(latest_surprise(&reports).unwrap().eps_surprise, Some(0.0));
    }

    #[test]
    fn test_social_summary() {
        let bull: Vec<SocialSentimentEntry> =
            serde_json::from_value(json!([{"symbol":"ACME","sentiment":60.0,"lastSentiment":55.0}])).unwrap();
        let bear: Vec<SocialSentimentEntry> =
            serde_json::from_value(json!([{"symbol":"ACME","sentiment":40.0}])).unwrap();
        let s = summarize_social("ACME", Some(bull.as_slice()), Some(bear.as_slice())).unwrap();
        assert_relative_eq!(s.bullish_ratio.unwrap(), 0.6);
        assert_relative_eq!(s.change_pct_points.unwrap(), 5.0);
        assert!(summarize_social("ACME", None, Some(&[][..])).is_none());
    }

    #[test]
    fn test_social_rows_for_other_symbols_are_ignored() {
        let bull: Vec<SocialSentimentEntry> =
            serde_json::from_value(json!([{"symbol":"OTHER","sentiment":90.0}])).unwrap();
        let bear: Vec<SocialSentimentEntry> =
            serde_json::from_value(json!([{"symbol":"OTHER","sentiment":10.0}])).unwrap();
        assert!(summarize_social("ACME", Some(bull.as_slice()), Some(bear.as_slice())).is_none());
    }
}
