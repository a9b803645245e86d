//! Store error types

use thiserror::Error;

/// History store error
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend could not be reached or timed out; a retry may succeed.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected a query.
    #[error("Query failed: {0}")]
    Query(String),

    /// A stored row could not be decoded.
    #[error("Failed to parse stored row: {0}")]
    Parse(String),

    /// An aggregate asked for a field it is not defined over.
    #[error("Invalid aggregate: {0}")]
    InvalidAggregate(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
