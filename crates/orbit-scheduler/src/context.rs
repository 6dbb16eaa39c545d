use std::time::{Duration, Instant};

use crate::{check_cancelled, CancellationToken, Cancelled};

/// Per-request context: a cancellation token plus an optional deadline.
///
/// The context is `Clone` so it can be handed to worker threads. Deadlines are enforced at
/// checkpoints: [`RequestContext::check`] cancels the token once the deadline has passed.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the remaining time budget until the deadline.
    fn remaining(&self) -> Option<Duration> {
        Some(self.deadline?.saturating_duration_since(Instant::now()))
    }

    /// Fails once the token is cancelled or the deadline has passed.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.remaining().is_some_and(|remaining| remaining.is_zero()) {
            self.cancel.cancel();
        }
        check_cancelled(&self.cancel)
    }
}
