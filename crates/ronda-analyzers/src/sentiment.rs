//! Market sentiment from insider trading, earnings surprises and social media.

use ronda_traits::{
    Analyzer, EarningsSurprise, FinancialRecord, InsiderActivity, SectorBenchmark,
    SocialSentiment, SubScore,
};
use serde::{Deserialize, Serialize};

/// Score given to a signal with no data.
pub const NEUTRAL: f64 = 0.5;

/// Configuration for the sentiment analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Weight of insider trading (default: 0.40)
    pub insider_weight: f64,
    /// Weight of earnings surprises (default: 0.35)
    pub earnings_weight: f64,
    /// Weight of social sentiment (default: 0.25)
    pub social_weight: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            insider_weight: 0.40,
            earnings_weight: 0.35,
            social_weight: 0.25,
        }
    }
}

/// Sentiment analyzer. Missing signals score a neutral 0.5.
#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer {
    config: SentimentConfig,
}

impl SentimentAnalyzer {
    /// Create a sentiment analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: SentimentConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &SentimentConfig {
        &self.config
    }
}

/// Buy-to-sell ratio band shared by counts and values.
fn flow_band(buys: f64, sells: f64) -> f64 {
    match (buys > 0.0, sells > 0.0) {
        (false, false) => NEUTRAL,
        (false, true) => 0.0,
        (true, false) => 1.0,
        (true, true) => {
            let ratio = buys / sells;
            if ratio >= 2.0 {
                1.0
            } else if ratio >= 1.0 {
                0.8
            } else if ratio >= 0.5 {
                0.4
            } else {
                0.2
            }
        }
    }
}

/// Insider score: transaction counts, transaction values, and significant buying.
#[must_use]
pub fn insider_score(activity: Option<&InsiderActivity>) -> f64 {
    let Some(a) = activity.filter(|a| !a.is_empty()) else {
        return NEUTRAL;
    };
    let counts = flow_band(f64::from(a.buy_count), f64::from(a.sell_count));
    let values = flow_band(a.buy_value, a.sell_value);
    let significant = if a.significant_buying() { 1.0 } else { NEUTRAL };
    0.4 * counts + 0.4 * values + 0.2 * significant
}

fn eps_surprise_band(s: f64) -> f64 {
    if s >= 0.2 {
        1.0
    } else if s >= 0.1 {
        0.9
    } else if s >= 0.05 {
        0.8
    } else if s >= 0.0 {
        0.7
    } else if s >= -0.05 {
        0.4
    } else if s >= -0.1 {
        0.3
    } else if s >= -0.2 {
        0.2
    } else {
        0.1
    }
}

fn revenue_surprise_band(s: f64) -> f64 {
    if s >= 0.1 {
        1.0
    } else if s >= 0.05 {
        0.9
    } else if s >= 0.02 {
        0.8
    } else if s >= 0.0 {
        0.7
    } else if s >= -0.02 {
        0.4
    } else if s >= -0.05 {
        0.3
    } else if s >= -0.1 {
        0.2
    } else {
        0.1
    }
}

/// Earnings score: 60% EPS surprise, 40% revenue surprise.
#[must_use]
pub fn earnings_score(surprise: Option<&EarningsSurprise>) -> f64 {
    let Some(s) = surprise else {
        return NEUTRAL;
    };
    let eps = s.eps_surprise.map_or(NEUTRAL, eps_surprise_band);
    let revenue = s.revenue_surprise.map_or(NEUTRAL, revenue_surprise_band);
    0.6 * eps + 0.4 * revenue
}

/// Social score: 70% bullish share, 30% its change in percentage points.
#[must_use]
pub fn social_score(sentiment: Option<&SocialSentiment>) -> f64 {
    let Some(s) = sentiment else {
        return NEUTRAL;
    };
    let base = s.bullish_ratio.map_or(NEUTRAL, |ratio| {
        if ratio >= 0.8 {
            1.0
        } else if ratio >= 0.6 {
            0.8
        } else if ratio >= 0.4 {
            0.5
        } else if ratio >= 0.2 {
            0.3
        } else {
            0.0
        }
    });
    let change = s.change_pct_points.unwrap_or(0.0);
    let momentum = if change >= 5.0 {
        1.0
    } else if change >= 2.0 {
        0.8
    } else if change > -2.0 {
        0.5
    } else if change > -5.0 {
        0.3
    } else {
        0.0
    };
    0.7 * base + 0.3 * momentum
}

impl Analyzer for SentimentAnalyzer {
    fn name(&self) -> &str {
        "sentiment"
    }

    fn analyze(&self, record: &FinancialRecord, _benchmark: &SectorBenchmark) -> SubScore {
        let insider = record.insider.as_ref();
        SubScore::weighted(&[
            ("insider", insider_score(insider), self.config.insider_weight),
            (
                "earnings",
                earnings_score(record.earnings.as_ref()),
                self.config.earnings_weight,
            ),
            ("social", social_score(record.social.as_ref()), self.config.social_weight),
        ])
        .with_metric("insider_buy_sell_ratio", insider.map(InsiderActivity::buy_sell_ratio))
        .with_metric("eps_surprise", record.earnings.and_then(|e| e.eps_surprise))
        .with_metric("revenue_surprise", record.earnings.and_then(|e| e.revenue_surprise))
        .with_metric("bullish_ratio", record.social.and_then(|s| s.bullish_ratio))
    }
}
