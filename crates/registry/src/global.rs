//! Process-wide cleanup registry
//!
//! A convenience for programs that do not want to thread a [`Registry`]
//! through every function. Everything here delegates to one shared instance;
//! library code and tests should prefer a local registry.

use crate::action::Action;
use crate::defer::Defer;
use crate::registry::Registry;
use once_cell::sync::Lazy;
use teardown_core::{BoxError, CleanupErrors, Result};

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Handle to the process-wide registry, usable wherever `impl Defer` is taken
#[derive(Debug, Clone, Copy, Default)]
pub struct Global;

impl Defer for Global {
    fn defer_action(&self, action: Action) {
        GLOBAL_REGISTRY.push(action);
    }
}

/// The process-wide registry
pub fn registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

/// Register an action with the process-wide registry
pub fn register<F, E>(cleanup_fn: F)
where
    F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
    E: Into<BoxError>,
{
    GLOBAL_REGISTRY.register(cleanup_fn);
}

/// Register an action that may be absent with the process-wide registry.
///
/// # Panics
///
/// Panics on `None`, see [`Registry::register_optional`].
pub fn register_optional<F, E>(cleanup_fn: Option<F>)
where
    F: FnOnce() -> std::result::Result<(), E> + Send + 'static,
    E: Into<BoxError>,
{
    GLOBAL_REGISTRY.register_optional(cleanup_fn);
}

/// Run the process-wide registry, see [`Registry::run`]
pub fn run() -> std::result::Result<(), CleanupErrors> {
    GLOBAL_REGISTRY.run()
}

/// Run the process-wide registry when SIGINT or SIGTERM arrives, then exit
/// with `128 + signal`.
///
/// Call once at startup. On platforms without POSIX signals this does nothing.
///
/// Only actions still pending in the global registry run. A batch another
/// thread has already drained with [`run`] is not waited for: the process
/// exits as soon as the signal batch finishes, cutting off any of those
/// actions still in flight.
pub fn install_signal_handler() -> Result<()> {
    #[cfg(unix)]
    {
        use signal_hook::{consts::SIGINT, consts::SIGTERM, iterator::Signals};
        use teardown_core::Error;

        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(Error::signal)?;

        std::thread::Builder::new()
            .name("teardown-signals".to_string())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    std::process::exit(shutdown(sig));
                }
            })
            .map_err(Error::signal)?;
    }

    Ok(())
}

/// Run the process-wide registry on behalf of signal `sig` and return the
/// exit code to terminate with. Panics and failures are logged, never raised.
#[cfg_attr(not(unix), allow(dead_code))]
fn shutdown(sig: i32) -> i32 {
    tracing::info!(signal = sig, "received signal, running cleanup actions");

    let batch = GLOBAL_REGISTRY.run_batch();
    if batch.panic.is_some() {
        tracing::error!("a cleanup action panicked during signal shutdown");
    }
    for error in &batch.errors {
        tracing::error!(error = %error, "cleanup action failed during signal shutdown");
    }
    tracing::debug!(actions = batch.executed, "signal cleanup finished");

    128 + sig
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serial_test::serial;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct Failure(&'static str);

    #[test]
    #[serial]
    fn test_global_register_and_run() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        register(move || {
            first.lock().push(1);
            Ok::<(), Failure>(())
        });
        let second = Arc::clone(&log);
        Global.defer_infallible(move || second.lock().push(2));
        register(|| Err(Failure("global")));

        let errors = run().unwrap_err();
        assert!(errors.contains(&Failure("global")));
        assert_eq!(*log.lock(), vec![2, 1]);

        assert!(run().is_ok());
        assert!(registry().is_empty());
    }

    #[test]
    #[serial]
    fn test_global_register_absent_panics() {
        let result = std::panic::catch_unwind(|| {
            register_optional(None::<fn() -> std::result::Result<(), Failure>>);
        });
        assert!(result.is_err());
        assert!(registry().is_empty());
    }

    #[test]
    #[serial]
    fn test_shutdown_runs_everything_and_reports_exit_code() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        register(move || {
            first.lock().push(1);
            Ok::<(), Failure>(())
        });
        register(|| -> std::result::Result<(), Failure> { panic!("during shutdown") });
        register(|| Err(Failure("logged")));
        let last = Arc::clone(&log);
        Global.defer_infallible(move || last.lock().push(4));

        assert_eq!(shutdown(2), 130);
        assert_eq!(*log.lock(), vec![4, 1]);
        assert!(registry().is_empty());

        assert_eq!(shutdown(15), 143);
    }
}
