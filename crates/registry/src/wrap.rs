//! Helpers that adapt closures before they are registered

use std::convert::Infallible;
use std::fmt::Display;
use teardown_core::{BoxError, Error};

const PLACEHOLDERS: [&str; 4] = ["{}", "%s", "%v", "%w"];

/// Decorate the failure of `cleanup_fn` with a contextual message.
///
/// The first placeholder in `template` (`{}`, `%s`, `%v` or `%w`) is replaced
/// by the original failure. Without a placeholder the failure is appended
/// after a colon. The original failure stays reachable as the error's source.
pub fn decorate<F, E>(
    cleanup_fn: F,
    template: impl Into<String>,
) -> impl FnOnce() -> Result<(), Error> + Send + 'static
where
    F: FnOnce() -> Result<(), E> + Send + 'static,
    E: Into<BoxError>,
{
    let template = template.into();
    move || {
        cleanup_fn().map_err(|e| {
            let source: BoxError = e.into();
            Error::decorated(render(&template, &source), source)
        })
    }
}

/// Lift a side effect that cannot fail into a cleanup action
pub fn lift<F>(side_effect: F) -> impl FnOnce() -> Result<(), Infallible> + Send + 'static
where
    F: FnOnce() + Send + 'static,
{
    move || {
        side_effect();
        Ok(())
    }
}

fn render(template: &str, cause: &dyn Display) -> String {
    let placeholder = PLACEHOLDERS
        .iter()
        .filter_map(|p| template.find(p).map(|at| (at, p.len())))
        .min_by_key(|&(at, _)| at);

    match placeholder {
        Some((at, len)) => format!("{}{}{}", &template[..at], cause, &template[at + len..]),
        None => format!("{template}: {cause}"),
    }
}
