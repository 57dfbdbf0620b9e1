//! Running a registry when a scope exits

use crate::registry::{panic_message, Registry};
use std::panic;
use teardown_core::{BoxError, CleanupErrors, Error, Result};
use tracing::{error, warn};

/// Runs its registry when dropped.
///
/// Prefer [`RunGuard::finish`] on the success path so failures reach the
/// caller; a plain drop (early return, `?`, unwinding) can only log them.
#[must_use = "dropping the guard immediately runs the registry"]
pub struct RunGuard<'a> {
    registry: &'a Registry,
    armed: bool,
}

impl Registry {
    /// Create a guard that runs this registry on scope exit
    pub fn guard(&self) -> RunGuard<'_> {
        RunGuard {
            registry: self,
            armed: true,
        }
    }
}

impl<'a> RunGuard<'a> {
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Run the registry now and report its outcome
    pub fn finish(mut self) -> std::result::Result<(), CleanupErrors> {
        self.armed = false;
        self.registry.run()
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let batch = self.registry.run_batch();
        for failure in &batch.errors {
            warn!(error = %failure, "cleanup action failed on scope exit");
        }

        if let Some(payload) = batch.panic {
            if std::thread::panicking() {
                // Resuming here would abort the process.
                error!(
                    panic = panic_message(payload.as_ref()),
                    actions = batch.executed,
                    "cleanup action panicked while unwinding"
                );
            } else {
                panic::resume_unwind(payload);
            }
        }
    }
}

/// Run `body` with a fresh registry and always run that registry afterwards.
///
/// Acquisition helpers called from `body` register their teardown on the
/// registry they are handed; the teardown happens here in reverse once the
/// body returns or unwinds. Failures of the body and of the cleanup are both
/// reported: a failed body yields [`Error::Scope`] carrying any cleanup
/// failures, a successful body with failed cleanup yields [`Error::Cleanup`].
pub fn scope<T, E, F>(body: F) -> Result<T>
where
    F: FnOnce(&Registry) -> std::result::Result<T, E>,
    E: Into<BoxError>,
{
    let registry = Registry::new();
    let guard = registry.guard();
    let outcome = body(guard.registry());
    let cleanup = guard.finish();

    settle(outcome, cleanup)
}

/// Combine the outcome of a body with the outcome of running its cleanup.
///
/// A failed body yields [`Error::Scope`] carrying any cleanup failures; a
/// successful body with failed cleanup yields [`Error::Cleanup`].
pub fn settle<T, E>(
    outcome: std::result::Result<T, E>,
    cleanup: std::result::Result<(), CleanupErrors>,
) -> Result<T>
where
    E: Into<BoxError>,
{
    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(errors)) => Err(Error::Cleanup(errors)),
        (Err(e), Ok(())) => Err(Error::scope(e, None)),
        (Err(e), Err(errors)) => Err(Error::scope(e, Some(errors))),
    }
}
