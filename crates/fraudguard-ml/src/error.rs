//! ML scorer error types

use thiserror::Error;

/// Scoring error
#[derive(Error, Debug)]
pub enum MlError {
    /// Artifacts for the requested UUID are missing or unloadable.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// An artifact file exists but cannot be read or parsed.
    #[error("Model artifact error: {0}")]
    Artifact(String),

    /// The loaded booster failed to produce a score.
    #[error("Prediction failed: {0}")]
    Prediction(String),

    /// The history store failed while building features.
    #[error("History lookup failed: {0}")]
    History(#[from] fraudguard_store::StoreError),

    /// A model load exceeded its deadline.
    #[error("Model load timed out: {0}")]
    Timeout(String),
}

impl MlError {
    pub fn is_retryable(&self) -> bool {
        match self {
            MlError::History(e) => e.is_retryable(),
            MlError::Timeout(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MlError>;
