//! Engine error types

use fraudguard_core::CoreError;
use fraudguard_ml::MlError;
use fraudguard_store::StoreError;
use thiserror::Error;

/// Rule engine error
#[derive(Error, Debug)]
pub enum EngineError {
    /// A rule configuration is unusable: wrong variant body or missing
    /// prerequisites. Fatal for that request only.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Expression evaluation failed.
    #[error(transparent)]
    Evaluation(#[from] CoreError),

    /// The history store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The ML scorer failed.
    #[error(transparent)]
    Model(#[from] MlError),

    /// A message could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A message could not be serialized for publish.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Evaluation(e) => e.is_retryable(),
            EngineError::Store(e) => e.is_retryable(),
            EngineError::Model(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
