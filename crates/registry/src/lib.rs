//! Ordered cleanup registry.
//!
//! Code that acquires a resource registers the action that releases it and
//! returns; a single terminal [`Registry::run`] later executes every
//! registered action in reverse and aggregates all failures into one
//! [`CleanupErrors`].
//!
//! ## Key Components
//!
//! - **`registry`**: the [`Registry`] itself, safe for concurrent registration.
//! - **`defer`**: the [`Defer`] trait acquisition helpers register through.
//! - **`wrap`**: [`decorate`] adds context to a failure, [`lift`] adapts
//!   closures that cannot fail.
//! - **`guard`**: [`RunGuard`] and [`scope`] run a registry on scope exit.
//! - **`global`**: an optional process-wide registry and signal hook.

pub mod action;
pub mod defer;
pub mod global;
pub mod guard;
pub mod registry;
pub mod wrap;

pub use action::Action;
pub use defer::Defer;
pub use global::Global;
pub use guard::{scope, settle, RunGuard};
pub use registry::Registry;
pub use teardown_core::{BoxError, CleanupErrors, Error, Result};
pub use wrap::{decorate, lift};
