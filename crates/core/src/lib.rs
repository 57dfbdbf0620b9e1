//! Core error types for the `teardown` workspace.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   the `BoxError` every cleanup action reports, and `CleanupErrors`, the
//!   ordered aggregate returned when a cleanup run has failing actions.

pub mod errors;

pub use self::errors::{BoxError, CleanupErrors, Error, Result};
