//! Run-level and job-level errors.

use ronda_fmp::FmpError;
use ronda_traits::RondaError;
use thiserror::Error;

/// Failures that abort a whole screening run.
///
/// Per-entity problems never surface here; they are recorded as
/// [`EntityFailure`](crate::EntityFailure)s in the report.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// The criteria or scoring configuration is invalid. Raised before any fetch.
    #[error("invalid screening input: {0}")]
    Validation(#[from] RondaError),

    /// The universe could not be fetched.
    #[error("universe fetch failed: {0}")]
    Universe(#[source] FmpError),

    /// The provider listed no equities for the configured exchange.
    #[error("universe is empty")]
    EmptyUniverse,

    /// The provider rejected the API key.
    #[error("credential rejected: {0}")]
    Credential(#[source] FmpError),

    /// The run was cancelled.
    #[error("screening cancelled")]
    Cancelled,
}

impl ScreenError {
    /// Turn a run-fatal provider error into the run error it implies.
    ///
    /// # Errors
    ///
    /// Hands `error` back when it only affects one entity.
    pub fn escalate(error: FmpError) -> std::result::Result<Self, FmpError> {
        match error {
            FmpError::Cancelled => Ok(Self::Cancelled),
            e if e.is_fatal_for_run() => Ok(Self::Credential(e)),
            e => Err(e),
        }
    }
}

/// Errors from the job boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// No job with this id.
    #[error("job not found: {0}")]
    NotFound(String),

    /// The job has not finished yet.
    #[error("job {0} is still running")]
    NotReady(String),

    /// The job failed or was cancelled.
    #[error("job failed: {0}")]
    Failed(String),
}

/// Result type for screening runs.
pub type Result<T> = std::result::Result<T, ScreenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate() {
        assert!(matches!(
            ScreenError::escalate(FmpError::Cancelled),
            Ok(ScreenError::Cancelled)
        ));
        assert!(matches!(
            ScreenError::escalate(FmpError::Unauthorized("401".into())),
            Ok(ScreenError::Credential(_))
        ));
        assert!(matches!(
            ScreenError::escalate(FmpError::NotFound("X".into())),
            Err(FmpError::NotFound(_))
        ));
    }

    #[test]
    fn test_validation_from_core_error() {
        let err: ScreenError = RondaError::Validation("maxPE must be finite".into()).into();
        assert!(err.to_string().contains("maxPE"));
    }
}
