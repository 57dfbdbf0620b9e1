//! Core error type definitions

use super::aggregate::CleanupErrors;
use std::path::PathBuf;

/// Failure value reported by a single cleanup action.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for teardown operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for teardown operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more cleanup actions failed during a run
    #[error(transparent)]
    Cleanup(#[from] CleanupErrors),

    /// A cleanup failure decorated with a contextual message
    #[error("{message}")]
    Decorated {
        message: String,
        #[source]
        source: BoxError,
    },

    /// The body of a cleanup scope failed
    #[error("{}", format_scope_error(.source, .cleanup))]
    Scope {
        #[source]
        source: BoxError,
        cleanup: Option<CleanupErrors>,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{}': {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Installing the termination signal handler failed
    #[error("failed to install signal handler: {source}")]
    Signal {
        #[source]
        source: std::io::Error,
    },
}

fn format_scope_error(source: &BoxError, cleanup: &Option<CleanupErrors>) -> String {
    match cleanup {
        Some(errors) => format!("{source} (cleanup also failed: {errors})"),
        None => source.to_string(),
    }
}
