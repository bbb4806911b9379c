//! In-memory job registry for asynchronous screenings.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use ronda_combine::QualityScorer;
use ronda_fmp::DataFetcher;
use ronda_traits::ScreeningCriteria;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    JobError, Result, ScreenConfig, ScreenError, ScreenProgress, Screener, ScreeningReport,
};

/// Job identifier (UUID v4).
pub type JobId = Uuid;

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Accepted, not yet started.
    Pending,
    /// Screening in progress.
    Running,
    /// Finished with results.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled before finishing.
    Cancelled,
}

impl JobState {
    /// Whether the job can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Externally visible status of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job id.
    pub id: JobId,
    /// Lifecycle state.
    pub status: JobState,
    /// Progress in percent, 0 to 100.
    pub progress: u8,
    /// Error text for failed or cancelled jobs.
    pub error: Option<String>,
    /// When the job was accepted.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Job {
    state: JobState,
    progress: watch::Receiver<ScreenProgress>,
    cancel: CancellationToken,
    outcome: Option<std::result::Result<ScreeningReport, String>>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

type Jobs = Arc<RwLock<HashMap<JobId, Job>>>;

/// Accepts screening requests and runs each one as a background task.
///
/// Jobs live in memory only and share one fetcher, so all of them draw from
/// the same rate budget, semaphore and cache. Finished jobs stay until
/// [`remove`](Self::remove)d or [`evict_finished`](Self::evict_finished).
#[derive(Debug, Clone)]
pub struct JobRegistry {
    fetcher: DataFetcher,
    scorer: Arc<QualityScorer>,
    config: ScreenConfig,
    root: CancellationToken,
    jobs: Jobs,
}

impl JobRegistry {
    /// Create a registry.
    #[must_use]
    pub fn new(fetcher: DataFetcher, scorer: Arc<QualityScorer>, config: ScreenConfig) -> Self {
        Self {
            fetcher,
            scorer,
            config,
            root: CancellationToken::new(),
            jobs: Arc::default(),
        }
    }

    /// Validate `criteria` and start screening in the background.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`ScreenError::Validation`] when the criteria are invalid; no job is created.
    pub async fn start_screening(&self, criteria: ScreeningCriteria) -> Result<JobId> {
        criteria.validate().map_err(ScreenError::Validation)?;

        let id = Uuid::new_v4();
        let cancel = self.root.child_token();
        let screener = Screener::new(
            self.fetcher.clone(),
            Arc::clone(&self.scorer),
            self.config.clone(),
        )
        .with_cancellation(cancel.clone());
        let job = Job {
            state: JobState::Pending,
            progress: screener.subscribe(),
            cancel,
            outcome: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        self.jobs.write().await.insert(id, job);
        info!(job = %id, "screening job accepted");

        let jobs = Arc::clone(&self.jobs);
        tokio::spawn(async move {
            if let Some(job) = jobs.write().await.get_mut(&id) {
                job.state = JobState::Running;
            }
            let result = screener.screen(&criteria).await;
            let mut jobs = jobs.write().await;
            let Some(job) = jobs.get_mut(&id) else {
                return;
            };
            job.finished_at = Some(Utc::now());
            match result {
                Ok(report) => {
                    info!(job = %id, results = report.results.len(), "screening job completed");
                    job.state = JobState::Completed;
                    job.outcome = Some(Ok(report));
                }
                Err(ScreenError::Cancelled) => {
                    info!(job = %id, "screening job cancelled");
                    job.state = JobState::Cancelled;
                    job.outcome = Some(Err(ScreenError::Cancelled.to_string()));
                }
                Err(e) => {
                    warn!(job = %id, error = %e, "screening job failed");
                    job.state = JobState::Failed;
                    job.outcome = Some(Err(e.to_string()));
                }
            }
        });
        Ok(id)
    }

    /// Status of a job, or `None` for an unknown id.
    pub async fn get_status(&self, id: JobId) -> Option<JobStatus> {
        let jobs = self.jobs.read().await;
        let job = jobs.get(&id)?;
        let progress = match job.state {
            JobState::Completed => 100,
            JobState::Pending => 0,
            _ => job.progress.borrow().percent(),
        };
        let error = job
            .outcome
            .as_ref()
            .and_then(|outcome| outcome.as_ref().err().cloned());
        Some(JobStatus {
            id,
            status: job.state,
            progress,
            error,
            created_at: job.created_at,
        })
    }

    /// Results of a finished job.
    ///
    /// # Errors
    ///
    /// [`JobError::NotFound`] for an unknown id, [`JobError::NotReady`] while
    /// the job runs, [`JobError::Failed`] when it failed or was cancelled.
    pub async fn get_results(&self, id: JobId) -> std::result::Result<ScreeningReport, JobError> {
        let jobs = self.jobs.read().await;
        let job = jobs.get(&id).ok_or_else(|| JobError::NotFound(id.to_string()))?;
        match &job.outcome {
            None => Err(JobError::NotReady(id.to_string())),
            Some(Ok(report)) => Ok(report.clone()),
            Some(Err(e)) => Err(JobError::Failed(e.clone())),
        }
    }

    /// Request cancellation of a job. Finished jobs are left untouched.
    ///
    /// # Errors
    ///
    /// [`JobError::NotFound`] for an unknown id.
    pub async fn cancel(&self, id: JobId) -> std::result::Result<(), JobError> {
        let jobs = self.jobs.read().await;
        let job = jobs.get(&id).ok_or_else(|| JobError::NotFound(id.to_string()))?;
        if !job.state.is_terminal() {
            info!(job = %id, "cancelling screening job");
            job.cancel.cancel();
        }
        Ok(())
    }

    /// Forget a finished job and its results.
    ///
    /// # Errors
    ///
    /// [`JobError::NotFound`] for an unknown id, [`JobError::NotReady`] while
    /// the job runs.
    pub async fn remove(&self, id: JobId) -> std::result::Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get(&id).ok_or_else(|| JobError::NotFound(id.to_string()))?;
        if !job.state.is_terminal() {
            return Err(JobError::NotReady(id.to_string()));
        }
        jobs.remove(&id);
        Ok(())
    }

    /// Drop jobs that finished more than `retention` ago. Returns how many were dropped.
    pub async fn evict_finished(&self, retention: chrono::Duration) -> usize {
        let cutoff = Utc::now() - retention;
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| job.finished_at.is_none_or(|at| at > cutoff));
        let evicted = before - jobs.len();
        if evicted > 0 {
            info!(evicted, "evicted finished screening jobs");
        }
        evicted
    }

    /// Cancel every running job.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    /// Number of known jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether the registry holds no job.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScreenStage;
    use ronda_fmp::{ClientConfig, FetchConfig, FmpClient};

    fn registry() -> JobRegistry {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ClientConfig::default()
        };
        let client = FmpClient::with_config("test-key", &config).unwrap();
        JobRegistry::new(
            DataFetcher::new(client, FetchConfig::default()),
            Arc::new(QualityScorer::default()),
            ScreenConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_invalid_criteria_create_no_job() {
        let registry = registry();
        let criteria = ScreeningCriteria {
            min_quality_score: Some(2.0),
            ..Default::default()
        };
        let err = registry.start_screening(criteria).await.unwrap_err();
        assert!(matches!(err, ScreenError::Validation(_)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let registry = registry();
        let id = Uuid::new_v4();
        assert!(registry.get_status(id).await.is_none());
        assert_eq!(
            registry.get_results(id).await.unwrap_err(),
            JobError::NotFound(id.to_string())
        );
        assert!(registry.cancel(id).await.is_err());
    }

    async fn insert(registry: &JobRegistry, state: JobState, finished_ago: Option<i64>) -> JobId {
        let id = Uuid::new_v4();
        let (_, progress) = watch::channel(ScreenProgress::at(ScreenStage::Idle, 0));
        let now = Utc::now();
        let job = Job {
            state,
            progress,
            cancel: CancellationToken::new(),
            outcome: state
                .is_terminal()
                .then(|| Err(ScreenError::Cancelled.to_string())),
            created_at: now,
            finished_at: finished_ago.map(|mins| now - chrono::Duration::minutes(mins)),
        };
        registry.jobs.write().await.insert(id, job);
        id
    }

    #[tokio::test]
    async fn test_remove_only_finished_jobs() {
        let registry = registry();
        let running = insert(&registry, JobState::Running, None).await;
        let done = insert(&registry, JobState::Cancelled, Some(1)).await;

        assert_eq!(
            registry.remove(running).await.unwrap_err(),
            JobError::NotReady(running.to_string())
        );
        registry.remove(done).await.unwrap();
        assert!(registry.get_status(done).await.is_none());
        assert_eq!(
            registry.remove(done).await.unwrap_err(),
            JobError::NotFound(done.to_string())
        );
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_evict_finished_after_retention() {
        let registry = registry();
        let running = insert(&registry, JobState::Running, None).await;
        let stale = insert(&registry, JobState::Failed, Some(90)).await;
        let fresh = insert(&registry, JobState::Failed, Some(5)).await;

        assert_eq!(registry.evict_finished(chrono::Duration::minutes(60)).await, 1);
        assert!(registry.get_status(stale).await.is_none());
        assert!(registry.get_status(fresh).await.is_some());
        assert!(registry.get_status(running).await.is_some());
        assert_eq!(registry.evict_finished(chrono::Duration::minutes(60)).await, 0);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobState::Completed).unwrap(), "\"completed\"");
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Running.is_terminal());
    }
}
