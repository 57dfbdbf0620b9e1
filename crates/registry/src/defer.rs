//! The seam acquisition code registers its teardown through

use crate::action::Action;
use crate::registry::Registry;
use crate::wrap::{decorate, lift};
use teardown_core::BoxError;

/// Something cleanup actions can be deferred to.
///
/// Functions that acquire a resource take `&impl Defer` and register its
/// release before returning, so they work with a local [`Registry`] as well
/// as with the process-wide [`Global`](crate::global::Global) handle.
pub trait Defer {
    /// Queue an action for the next run
    fn defer_action(&self, action: Action);

    /// Queue a fallible closure
    fn defer<F, E>(&self, cleanup_fn: F)
    where
        Self: Sized,
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.defer_action(Action::new(cleanup_fn));
    }

    /// Queue a fallible closure whose failure is decorated with `template`
    fn defer_with_context<F, E>(&self, cleanup_fn: F, template: impl Into<String>)
    where
        Self: Sized,
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.defer_action(Action::new(decorate(cleanup_fn, template)));
    }

    /// Queue a side effect that cannot fail
    fn defer_infallible<F>(&self, side_effect: F)
    where
        Self: Sized,
        F: FnOnce() + Send + 'static,
    {
        self.defer_action(Action::new(lift(side_effect)));
    }
}

impl Defer for Registry {
    fn defer_action(&self, action: Action) {
        self.push(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("{0}")]
    struct Failure(&'static str);

    fn acquire(defer: &impl Defer, log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) {
        let log = Arc::clone(log);
        defer.defer_infallible(move || log.lock().push(name));
    }

    #[test]
    fn test_mixed_deferrals_run_in_reverse() {
        let registry = Registry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        registry.defer(move || {
            first.lock().push("fallible");
            Ok::<(), Failure>(())
        });
        acquire(&registry, &log, "infallible");
        registry.defer_with_context(|| Err(Failure("boom")), "closing socket: %s");

        let errors = registry.run().unwrap_err();
        assert_eq!(*log.lock(), vec!["infallible", "fallible"]);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(&Failure("boom")));
        assert_eq!(errors.iter().next().unwrap().to_string(), "closing socket: boom");
    }

    #[test]
    fn test_trait_object_registration() {
        let registry = Registry::new();
        let target: &dyn Defer = &registry;
        target.defer_action(Action::named("dyn", || Ok::<(), Failure>(())));
        assert_eq!(registry.len(), 1);
    }
}
