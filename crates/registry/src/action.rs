//! A single deferred cleanup action

use std::fmt;
use teardown_core::BoxError;

type CleanupFn = Box<dyn FnOnce() -> Result<(), BoxError> + Send + 'static>;

/// An opaque unit of cleanup work.
///
/// Owns whatever it releases through its captures; running it consumes it,
/// so an action can never execute twice.
pub struct Action {
    description: Option<String>,
    cleanup_fn: CleanupFn,
}

impl Action {
    /// Wrap a fallible closure
    pub fn new<F, E>(cleanup_fn: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            description: None,
            cleanup_fn: Box::new(move || cleanup_fn().map_err(Into::into)),
        }
    }

    /// Wrap a fallible closure with a description used in log output
    pub fn named<F, E>(description: impl Into<String>, cleanup_fn: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            description: Some(description.into()),
            ..Self::new(cleanup_fn)
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Execute the action, consuming it
    pub fn call(self) -> Result<(), BoxError> {
        (self.cleanup_fn)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
