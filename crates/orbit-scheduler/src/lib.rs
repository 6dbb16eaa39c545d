//! Cooperative cancellation primitives shared by Orbit's caches and CLI.
//!
//! Long-running computations take a [`CancellationToken`] (or a [`RequestContext`]) and call
//! [`check_cancelled`] (or [`RequestContext::check`]) at coarse checkpoints. Cancellation is a
//! signal, not a failure: callers get [`Cancelled`] back and are free to retry.

mod cancellation;
mod context;
mod watchdog;

pub use cancellation::{check_cancelled, Cancelled};
pub use context::RequestContext;
pub use tokio_util::sync::CancellationToken;
pub use watchdog::run_with_timeout;

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task was cancelled")]
    Cancelled,
    #[error("task exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
    #[error("task panicked")]
    Panicked,
}

impl From<Cancelled> for TaskError {
    fn from(_: Cancelled) -> Self {
        TaskError::Cancelled
    }
}
