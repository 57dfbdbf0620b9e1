//! The aggregated failure returned when a cleanup run has failing actions

use super::types::BoxError;
use std::error::Error as StdError;
use std::fmt;

/// Every failure reported by one cleanup run, in the order the failing
/// actions executed (the reverse of their registration order).
#[derive(Debug, Default)]
pub struct CleanupErrors {
    errors: Vec<BoxError>,
}

impl CleanupErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure
    pub fn push(&mut self, error: impl Into<BoxError>) {
        self.errors.push(error.into());
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the constituent failures in execution order
    pub fn iter(&self) -> impl Iterator<Item = &(dyn StdError + Send + Sync + 'static)> {
        self.errors.iter().map(|error| error.as_ref())
    }

    pub fn into_vec(self) -> Vec<BoxError> {
        self.errors
    }

    /// Returns true if any constituent failure, or any error in its source
    /// chain, is an `E` equal to `target`.
    ///
    /// Decorated failures match on the error they wrap, so a caller can ask
    /// whether a specific underlying failure occurred without knowing how it
    /// was reported.
    pub fn contains<E>(&self, target: &E) -> bool
    where
        E: StdError + PartialEq + 'static,
    {
        self.chains()
            .any(|error| error.downcast_ref::<E>().is_some_and(|found| found == target))
    }

    /// The first error of type `E` found across all failures and their sources
    pub fn find<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.chains().find_map(|error| error.downcast_ref::<E>())
    }

    fn chains(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        self.errors.iter().flat_map(|error| {
            let head: &(dyn StdError + 'static) = error.as_ref();
            std::iter::successors(Some(head), |&current| current.source())
        })
    }

    /// `Ok(())` when nothing failed, otherwise `Err(self)`
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for CleanupErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 {
            "action"
        } else {
            "actions"
        };
        write!(f, "{} cleanup {noun} failed:", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n\t* {error}")?;
        }
        Ok(())
    }
}

impl StdError for CleanupErrors {}

impl From<Vec<BoxError>> for CleanupErrors {
    fn from(errors: Vec<BoxError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for CleanupErrors {
    type Item = BoxError;
    type IntoIter = std::vec::IntoIter<BoxError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a CleanupErrors {
    type Item = &'a BoxError;
    type IntoIter = std::slice::Iter<'a, BoxError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
