//! Error types for the data layer.
//!
//! All errors are propagated via [`StoreError`] which wraps the underlying
//! [`sqlx`], [`serde_json`], and I/O errors with additional context about
//! which operation failed.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced entity does not exist.
    #[error("{what} not found: {id}")]
    NotFound {
        /// What kind of entity was looked up ("space", "event", ...).
        what: &'static str,
        /// The identifier that missed.
        id: String,
    },

    /// A caller supplied an invalid value.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// An atomic commit of a mutation plus its audit record failed; the
    /// mutation was rolled back and neither write is visible.
    #[error("transaction failed: {message}")]
    TransactionFailure {
        /// Description of the failure.
        message: String,
    },

    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A file read or write failed in the JSON backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Shorthand for a [`StoreError::NotFound`] with a displayable id.
    pub fn not_found(what: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }
}
