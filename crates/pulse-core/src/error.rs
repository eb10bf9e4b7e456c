//! Error types for the decision core.

use pulse_store::StoreError;

/// Errors that can occur in the decision core.
///
/// Repository failures pass through as [`CoreError::Store`] so callers can
/// distinguish a missing entity (`NotFound`) from a failed atomic commit
/// (`TransactionFailure`) without the core re-wrapping every variant.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A data-layer operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A caller supplied an invalid value; no repository access was
    /// attempted.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },
}
