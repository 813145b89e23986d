//! Store error types.

use thiserror::Error;

/// Errors surfaced by relationship store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the call failed outright.
    #[error("relationship store unavailable: {message}")]
    Unavailable { message: String },

    /// A tuple was rejected by the store.
    #[error("invalid tuple {tuple}: {message}")]
    InvalidTuple { tuple: String, message: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
