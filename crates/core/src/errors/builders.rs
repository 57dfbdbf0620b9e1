//! Builder methods for creating errors with context

use super::aggregate::CleanupErrors;
use super::types::{BoxError, Error};
use std::path::PathBuf;

impl Error {
    /// Create a decorated error that keeps the original failure as its source
    #[must_use]
    pub fn decorated(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Decorated {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Create a scope error from a failed body and the outcome of its cleanup
    #[must_use]
    pub fn scope(source: impl Into<BoxError>, cleanup: Option<CleanupErrors>) -> Self {
        Error::Scope {
            source: source.into(),
            cleanup,
        }
    }

    /// Create a file system error
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a signal handler installation error
    #[must_use]
    pub fn signal(source: std::io::Error) -> Self {
        Error::Signal { source }
    }

    /// The aggregated cleanup failures carried by this error, if any
    pub fn cleanup_errors(&self) -> Option<&CleanupErrors> {
        match self {
            Error::Cleanup(errors) => Some(errors),
            Error::Scope { cleanup, .. } => cleanup.as_ref(),
            _ => None,
        }
    }
}
