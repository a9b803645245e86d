//! Error types for FraudGuard Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Aggregate used outside a pattern rule context")]
    AggregateOutsideContext,

    /// An aggregate delegated to the history store and the store failed.
    #[error("Aggregate failed: {message}")]
    Aggregate { message: String, retryable: bool },
}

impl CoreError {
    /// Whether a retry of the same request could succeed. Evaluation errors
    /// never are; only a failed store-backed aggregate may be.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Aggregate { retryable: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
