//! Error types and the aggregated cleanup failure

mod aggregate;
mod builders;
mod types;

pub use aggregate::CleanupErrors;
pub use types::{BoxError, Error, Result};
