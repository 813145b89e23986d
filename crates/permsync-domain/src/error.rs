//! Domain error types.

use thiserror::Error;

/// Domain-specific errors.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Relation name does not map to a known role.
    #[error("unknown role: {value}")]
    UnknownRole { value: String },

    /// Object or subject key is not in "type:id" form.
    #[error("invalid key format: {value}")]
    InvalidKeyFormat { value: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
