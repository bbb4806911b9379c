//! Error types for the Ronda screener.
//!
//! These errors cover the domain layer: criteria validation and record
//! computations. Transport failures live in `ronda-fmp`, cache failures in
//! `ronda-cache`.

use thiserror::Error;

/// The main error type for Ronda domain operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// Screening criteria are out of domain (e.g. min > max).
    #[error("Invalid criteria: {0}")]
    Validation(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for RondaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for RondaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for Ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;
