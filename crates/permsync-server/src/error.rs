//! Service error types.

use permsync_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the reconciliation and lookup paths.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The baseline fetch of current state failed; no partial
    /// reconciliation is attempted without a baseline.
    #[error("failed to fetch current state: {source}")]
    StoreUnavailable {
        #[source]
        source: StoreError,
    },

    /// A direct (non-reconciling) store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The store returned an object key not in "type:id" form.
    #[error("malformed object key from store: {value}")]
    MalformedKey { value: String },
}

/// Result type for service operations.
pub type SyncResult<T> = Result<T, SyncError>;
