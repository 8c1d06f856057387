use std::fmt::Display;

use tracing::{debug, error, info};

/// Outcome of a side effect whose failure must not fail the caller.
///
/// Call [`discard`](Self::discard) to log the outcome and continue; the
/// `#[must_use]` makes an ignored failure visible at the call site.
#[must_use = "a best-effort outcome should be discarded explicitly"]
#[derive(Debug)]
pub enum BestEffort<T, E> {
    /// The side effect ran and succeeded.
    Done(T),
    /// The side effect was not attempted.
    Skipped(&'static str),
    /// The side effect ran and failed.
    Failed(E),
}

impl<T, E: Display> BestEffort<T, E> {
    /// Log the outcome under `context` and keep only a successful value.
    pub fn discard(self, context: &str) -> Option<T> {
        match self {
            Self::Done(value) => {
                debug!(context, "best-effort step completed");
                Some(value)
            }
            Self::Skipped(reason) => {
                info!(context, reason, "best-effort step skipped");
                None
            }
            Self::Failed(err) => {
                error!(context, error = %err, "best-effort step failed, continuing");
                None
            }
        }
    }
}

impl<T, E> BestEffort<T, E> {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

impl<T, E> From<Result<T, E>> for BestEffort<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Done(value),
            Err(err) => Self::Failed(err),
        }
    }
}
