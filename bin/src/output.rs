//! Report rendering.

use std::fmt::Write as _;

use anyhow::Result;
use clap::ValueEnum;
use ronda::{ScoredEntity, ScreeningReport};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Ranked table with score breakdowns.
    Text,
    /// The full report as pretty JSON.
    Json,
}

impl OutputFormat {
    /// Print `report` to stdout.
    pub(crate) fn print(self, report: &ScreeningReport) -> Result<()> {
        match self {
            Self::Text => print!("{}", render_text(report)),
            Self::Json => println!("{}", serde_json::to_string_pretty(report)?),
        }
        Ok(())
    }
}

fn row(rank: usize, entity: &ScoredEntity) -> String {
    let score = &entity.score;
    format!(
        "{:>4} {:<8} {:<24} {:>7.3} {:>7.3} {:>7.3} {:>7.3} {:>7.3} {:>6.3} {:>6.1}",
        rank,
        entity.symbol(),
        truncate(entity.sector(), 24),
        score.composite,
        score.growth.value,
        score.risk.value,
        score.valuation.value,
        score.sentiment.value,
        score.coherence_multiplier,
        score.sector_percentile,
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

/// Ranked table followed by the run summary.
pub(crate) fn render_text(report: &ScreeningReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Universe: {}  Profile pass: {}  ROE pass: {}  Scored: {}  Ranked: {}",
        report.universe_size,
        report.profile_passed,
        report.roe_passed,
        report.scored,
        report.results.len()
    );
    let _ = writeln!(out);

    if report.results.is_empty() {
        let _ = writeln!(out, "No entity met the criteria.");
    } else {
        let _ = writeln!(
            out,
            "{:>4} {:<8} {:<24} {:>7} {:>7} {:>7} {:>7} {:>7} {:>6} {:>6}",
            "Rank", "Symbol", "Sector", "Quality", "Growth", "Risk", "Value", "Sent", "Coh", "Pct"
        );
        let _ = writeln!(out, "{}", "─".repeat(92));
        for (i, entity) in report.results.iter().enumerate() {
            let _ = writeln!(out, "{}", row(i + 1, entity));
        }
    }

    if !report.rejections.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Rejections:");
        for (reason, count) in &report.rejections {
            let _ = writeln!(out, "  {reason:<16} {count:>6}");
        }
    }
    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Failures:");
        for failure in &report.failures {
            let _ = writeln!(out, "  {:<8} {:?}: {}", failure.symbol, failure.stage, failure.cause);
        }
    }

    let t = &report.timings;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Timings: filtering {}ms, fetching {}ms, ranking {}ms, total {}ms",
        t.filtering_ms, t.fetching_ms, t.ranking_ms, t.total_ms
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda::{
        QualityScore, ScreeningCriteria,
        traits::{CompanyProfile, SubScore},
    };

    fn entity(symbol: &str, composite: f64) -> ScoredEntity {
        ScoredEntity {
            profile: CompanyProfile {
                symbol: symbol.to_string(),
                name: String::new(),
                sector: "Communication Services and Media".to_string(),
                industry: String::new(),
                price: Some(10.0),
                market_cap: Some(1e10),
                is_etf: false,
                is_actively_trading: true,
            },
            market_cap: 1e10,
            score: QualityScore {
                composite,
                base: composite,
                growth: SubScore::new(0.8),
                risk: SubScore::new(0.7),
                valuation: SubScore::new(0.5),
                sentiment: SubScore::new(0.5),
                coherence_multiplier: 1.0,
                coherence_checks: Vec::new(),
                sector_percentile: 100.0,
                normalized: 1.0,
            },
        }
    }

    #[test]
    fn test_render_ranked_table() {
        let mut report = ScreeningReport::new(ScreeningCriteria::default());
        report.results = vec![entity("AAA", 0.712), entity("BBB", 0.655)];
        report.rejections.insert("market_cap".to_string(), 3);

        let text = render_text(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.iter().any(|l| l.contains("AAA") && l.contains("0.712")));
        let aaa = lines.iter().position(|l| l.contains("AAA")).unwrap();
        let bbb = lines.iter().position(|l| l.contains("BBB")).unwrap();
        assert!(aaa < bbb);
        assert!(text.contains("Communication Services …"));
        assert!(text.contains("market_cap"));
    }

    #[test]
    fn test_render_empty_result() {
        let report = ScreeningReport::new(ScreeningCriteria::default());
        assert!(render_text(&report).contains("No entity met the criteria."));
    }
}
