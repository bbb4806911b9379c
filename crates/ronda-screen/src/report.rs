//! Run progress and results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ronda_combine::ScoredEntity;
use ronda_traits::ScreeningCriteria;
use serde::{Deserialize, Serialize};

/// Stage of a screening run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenStage {
    /// Not started.
    Idle,
    /// Universe fetch, profile pass and ROE pass.
    Filtering,
    /// Full-record fetch and scoring of the survivors.
    Fetching,
    /// Sector percentiles and final ordering.
    Scoring,
    /// Finished with a ranked result.
    Ranked,
    /// Finished with a run-level error.
    Failed,
}

/// Snapshot published on the progress channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenProgress {
    /// Current stage.
    pub stage: ScreenStage,
    /// Entities finished within the stage.
    pub completed: usize,
    /// Entities the stage will process.
    pub total: usize,
}

impl ScreenProgress {
    /// Progress at the start of `stage`.
    #[must_use]
    pub const fn at(stage: ScreenStage, total: usize) -> Self {
        Self {
            stage,
            completed: 0,
            total,
        }
    }

    /// Whole-run progress in percent.
    ///
    /// Filtering covers 0 to 30, fetching 30 to 90, scoring 90 to 99.
    #[must_use]
    pub fn percent(&self) -> u8 {
        let within = if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64).clamp(0.0, 1.0)
        };
        let pct = match self.stage {
            ScreenStage::Idle | ScreenStage::Failed => 0.0,
            ScreenStage::Filtering => 30.0 * within,
            ScreenStage::Fetching => 30.0 + 60.0 * within,
            ScreenStage::Scoring => 90.0 + 9.0 * within,
            ScreenStage::Ranked => 100.0,
        };
        pct.round() as u8
    }
}

impl Default for ScreenProgress {
    fn default() -> Self {
        Self::at(ScreenStage::Idle, 0)
    }
}

/// Pipeline stage an entity failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Fetching the ROE history for the ROE pass.
    RoeHistory,
    /// Fetching or assembling the full record.
    Fetch,
}

/// A dropped entity and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFailure {
    /// Ticker symbol.
    pub symbol: String,
    /// Where it failed.
    pub stage: FailureStage,
    /// Error text.
    pub cause: String,
}

/// Wall-clock time spent per stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    /// Universe fetch plus both filter passes.
    pub filtering_ms: u64,
    /// Full-record fetch and scoring.
    pub fetching_ms: u64,
    /// Percentiles and ranking.
    pub ranking_ms: u64,
    /// Whole run.
    pub total_ms: u64,
}

/// Outcome of a screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// Criteria the run used.
    pub criteria: ScreeningCriteria,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Ranked entities, best first.
    pub results: Vec<ScoredEntity>,
    /// Profiles in the universe.
    pub universe_size: usize,
    /// Entities that passed the profile pass.
    pub profile_passed: usize,
    /// Entities that passed the ROE pass.
    pub roe_passed: usize,
    /// Entities scored successfully.
    pub scored: usize,
    /// Rejection counts by reason label.
    pub rejections: BTreeMap<String, usize>,
    /// Entities dropped because of an error.
    pub failures: Vec<EntityFailure>,
    /// Stage timings.
    pub timings: StageTimings,
}

impl ScreeningReport {
    /// An empty report for `criteria`, stamped with the current time.
    #[must_use]
    pub fn new(criteria: ScreeningCriteria) -> Self {
        Self {
            criteria,
            started_at: Utc::now(),
            results: Vec::new(),
            universe_size: 0,
            profile_passed: 0,
            roe_passed: 0,
            scored: 0,
            rejections: BTreeMap::new(),
            failures: Vec::new(),
            timings: StageTimings::default(),
        }
    }

    pub(crate) fn reject(&mut self, label: &str) {
        *self.rejections.entry(label.to_string()).or_default() += 1;
    }

    pub(crate) fn fail(&mut self, symbol: &str, stage: FailureStage, cause: String) {
        self.failures.push(EntityFailure {
            symbol: symbol.to_string(),
            stage,
            cause,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_by_stage() {
        assert_eq!(ScreenProgress::default().percent(), 0);
        let filtering = ScreenProgress {
            stage: ScreenStage::Filtering,
            completed: 5,
            total: 10,
        };
        assert_eq!(filtering.percent(), 15);
        let fetching = ScreenProgress {
            stage: ScreenStage::Fetching,
            completed: 10,
            total: 10,
        };
        assert_eq!(fetching.percent(), 90);
        assert_eq!(ScreenProgress::at(ScreenStage::Ranked, 0).percent(), 100);
        assert_eq!(ScreenProgress::at(ScreenStage::Fetching, 0).percent(), 30);
    }

    #[test]
    fn test_rejection_counts() {
        let mut report = ScreeningReport::new(ScreeningCriteria::default());
        report.reject("etf");
        report.reject("etf");
        report.reject("sector");
        assert_eq!(report.rejections["etf"], 2);
        assert_eq!(report.rejections.len(), 2);
    }
}
