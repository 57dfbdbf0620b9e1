//! The cleanup registry
//!
//! Actions are appended as resources are acquired and executed in reverse by
//! a single terminal [`Registry::run`], which drains the pending list under
//! the lock and runs the batch outside it. Every action in a batch runs even
//! when earlier ones fail or panic; failures are aggregated into one
//! [`CleanupErrors`] and the first panic is re-raised once the batch is done.

use crate::action::Action;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use teardown_core::{BoxError, CleanupErrors};
use tracing::{debug, error, warn};

/// Registry of cleanup actions, run last-registered-first.
///
/// Registration is safe from any number of threads. Under concurrent
/// registration the execution order is the reverse of the order in which
/// callers acquired the internal lock, not the order the calls were issued.
pub struct Registry {
    pending: Mutex<Vec<Action>>,
}

/// Outcome of executing one drained batch
pub(crate) struct Batch {
    pub(crate) executed: usize,
    pub(crate) errors: CleanupErrors,
    pub(crate) panic: Option<Box<dyn Any + Send + 'static>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::with_capacity(16)),
        }
    }

    /// Register a cleanup action to run on the next [`run`](Self::run)
    pub fn register<F, E>(&self, cleanup_fn: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.push(Action::new(cleanup_fn));
    }

    /// Register a cleanup action with a description used in log output
    pub fn register_named<F, E>(&self, description: impl Into<String>, cleanup_fn: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.push(Action::named(description, cleanup_fn));
    }

    /// Register an action that may be absent.
    ///
    /// # Panics
    ///
    /// Panics on `None`: a missing action is a bug in the caller. The pending
    /// list is left untouched.
    pub fn register_optional<F, E>(&self, cleanup_fn: Option<F>)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        let Some(cleanup_fn) = cleanup_fn else {
            panic!("absent cleanup action indicates a programming error");
        };
        self.register(cleanup_fn);
    }

    /// Append an already-built action
    pub fn push(&self, action: Action) {
        let description = action.description().map(str::to_owned);
        let pending = {
            let mut pending = self.pending.lock();
            pending.push(action);
            pending.len()
        };
        debug!(pending, description = description.as_deref(), "registered cleanup action");
    }

    /// Number of actions waiting for the next run
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Execute every pending action in reverse registration order.
    ///
    /// Returns `Err` with every failure, in execution order, when at least one
    /// action failed. A second call with nothing registered in between runs
    /// nothing and returns `Ok(())`. Actions may register further cleanup;
    /// those are deferred to the next run.
    ///
    /// # Panics
    ///
    /// If an action panics, the remaining actions of the batch still run and
    /// the first panic is then resumed. "First" is in execution order, so
    /// with several panicking actions the most recently registered one
    /// propagates, not the last one to run. Later panics are logged and
    /// discarded.
    pub fn run(&self) -> Result<(), CleanupErrors> {
        self.run_batch().into_result()
    }

    pub(crate) fn run_batch(&self) -> Batch {
        let actions = std::mem::take(&mut *self.pending.lock());
        let total = actions.len();
        debug!(actions = total, "running cleanup actions");

        let mut errors = CleanupErrors::new();
        let mut first_panic = None;

        for (index, action) in actions.into_iter().rev().enumerate() {
            let description = action.description().map(str::to_owned);
            match panic::catch_unwind(AssertUnwindSafe(|| action.call())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(
                        index,
                        description = description.as_deref(),
                        error = %e,
                        "cleanup action failed"
                    );
                    errors.push(e);
                }
                Err(payload) => {
                    error!(
                        index,
                        description = description.as_deref(),
                        panic = panic_message(payload.as_ref()),
                        "cleanup action panicked"
                    );
                    first_panic.get_or_insert(payload);
                }
            }
        }

        debug!(
            actions = total,
            failed = errors.len(),
            panicked = first_panic.is_some(),
            "cleanup actions finished"
        );

        Batch {
            executed: total,
            errors,
            panic: first_panic,
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("pending", &self.len())
            .finish()
    }
}

impl Batch {
    /// Resume a captured panic, otherwise report the collected failures
    pub(crate) fn into_result(self) -> Result<(), CleanupErrors> {
        if let Some(payload) = self.panic {
            if !self.errors.is_empty() {
                warn!(errors = %self.errors, "dropping cleanup failures to propagate panic");
            }
            panic::resume_unwind(payload);
        }
        self.errors.into_result()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct Failure(&'static str);

    fn recorder() -> Arc<Mutex<Vec<i32>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn record(log: &Arc<Mutex<Vec<i32>>>, value: i32) -> impl FnOnce() -> Result<(), Failure> {
        let log = Arc::clone(log);
        move || {
            log.lock().push(value);
            Ok(())
        }
    }

    #[test]
    fn test_empty_run() {
        let registry = Registry::default();
        assert!(registry.is_empty());
        assert!(registry.run().is_ok());
    }

    #[test]
    fn test_run_reverse_order() {
        let registry = Registry::new();
        let log = recorder();

        registry.register(record(&log, 1));
        registry.register(record(&log, 2));
        registry.register(record(&log, 3));
        assert_eq!(registry.len(), 3);

        assert!(registry.run().is_ok());
        assert_eq!(*log.lock(), vec![3, 2, 1]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_second_run_executes_nothing() {
        let registry = Registry::new();
        let log = recorder();
        registry.register(record(&log, 1));

        assert!(registry.run().is_ok());
        log.lock().clear();

        assert!(registry.run().is_ok());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let registry = Registry::new();
        let log = recorder();

        registry.register(record(&log, 1));
        let failing = Arc::clone(&log);
        registry.register(move || {
            failing.lock().push(2);
            Err(Failure("2"))
        });
        registry.register(record(&log, 3));

        let errors = registry.run().unwrap_err();
        assert_eq!(*log.lock(), vec![3, 2, 1]);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(&Failure("2")));
    }

    #[test]
    fn test_failures_collected_in_execution_order() {
        let registry = Registry::new();
        registry.register(|| Err(Failure("1")));
        registry.register(|| Ok::<(), Failure>(()));
        registry.register(|| Err(Failure("2")));

        let errors = registry.run().unwrap_err();
        assert!(errors.contains(&Failure("1")));
        assert!(errors.contains(&Failure("2")));

        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(messages, ["2", "1"]);
    }

    #[test]
    fn test_register_absent_panics_without_mutation() {
        let registry = Registry::new();
        registry.register(|| Ok::<(), Failure>(()));

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            registry.register_optional(None::<fn() -> Result<(), Failure>>);
        }));

        assert!(result.is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_optional_some() {
        let registry = Registry::new();
        let log = recorder();
        registry.register_optional(Some(record(&log, 7)));

        assert!(registry.run().is_ok());
        assert_eq!(*log.lock(), vec![7]);
    }

    #[test]
    fn test_panic_runs_remaining_actions_then_propagates() {
        let registry = Registry::new();
        let log = recorder();

        registry.register(record(&log, 1));
        let panicking = Arc::clone(&log);
        registry.register(move || -> Result<(), Failure> {
            panicking.lock().push(2);
            panic!("cleanup exploded");
        });
        registry.register(record(&log, 3));

        let result = panic::catch_unwind(AssertUnwindSafe(|| registry.run()));

        let payload = result.unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "cleanup exploded");
        assert_eq!(*log.lock(), vec![3, 2, 1]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_first_panic_wins() {
        let registry = Registry::new();
        registry.register(|| -> Result<(), Failure> { panic!("registered first") });
        registry.register(|| -> Result<(), Failure> { panic!("registered second") });

        let payload = panic::catch_unwind(AssertUnwindSafe(|| registry.run())).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "registered second");
    }

    #[test]
    fn test_reentrant_register_deferred_to_next_run() {
        let registry = Arc::new(Registry::new());
        let log = recorder();

        let inner_registry = Arc::clone(&registry);
        let inner_log = Arc::clone(&log);
        registry.register(move || {
            inner_registry.register(record(&inner_log, 2));
            inner_log.lock().push(1);
            Ok::<(), Failure>(())
        });

        assert!(registry.run().is_ok());
        assert_eq!(*log.lock(), vec![1]);
        assert_eq!(registry.len(), 1);

        assert!(registry.run().is_ok());
        assert_eq!(*log.lock(), vec![1, 2]);
    }

    #[test]
    fn test_named_actions_run_like_unnamed() {
        let registry = Registry::new();
        let log = recorder();
        registry.register_named("first", record(&log, 1));
        registry.push(Action::named("second", record(&log, 2)));

        assert!(registry.run().is_ok());
        assert_eq!(*log.lock(), vec![2, 1]);
    }

    #[test]
    fn test_debug_shows_pending_count() {
        let registry = Registry::new();
        registry.register(|| Ok::<(), Failure>(()));
        assert_eq!(format!("{registry:?}"), "Registry { pending: 1 }");
    }
}
