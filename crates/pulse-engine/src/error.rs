//! Error types for the decision daemon binary.
//!
//! [`DaemonError`] is the top-level error type that wraps all possible
//! failure modes during daemon startup and the sweep loop.

/// Top-level error for the decision daemon binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: pulse_core::config::ConfigError,
    },

    /// Opening a storage backend or running migrations failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: pulse_store::StoreError,
    },

    /// The decision pipeline failed.
    #[error("core error: {source}")]
    Core {
        /// The underlying decision-core error.
        #[from]
        source: pulse_core::CoreError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
