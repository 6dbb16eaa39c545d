use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::{CancellationToken, RequestContext, TaskError};

/// Runs `f` on a worker thread and waits up to `timeout` for it to finish.
///
/// When the deadline passes the token is cancelled and the caller gets
/// [`TaskError::DeadlineExceeded`]. The closure receives a [`RequestContext`] carrying the same
/// deadline; work that calls [`RequestContext::check`] stops at its next checkpoint.
pub fn run_with_timeout<T, F>(
    timeout: Duration,
    cancel_token: CancellationToken,
    f: F,
) -> Result<T, TaskError>
where
    T: Send + 'static,
    F: FnOnce(RequestContext) -> T + Send + 'static,
{
    if cancel_token.is_cancelled() {
        return Err(TaskError::Cancelled);
    }

    let started = Instant::now();
    let deadline = started + timeout;
    let ctx = RequestContext::new(cancel_token.clone()).with_deadline(deadline);

    let (tx, rx) = mpsc::channel::<Result<T, TaskError>>();
    std::thread::Builder::new()
        .name("orbit-watchdog-worker".to_owned())
        .spawn(move || {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(ctx)))
                .map_err(|_| TaskError::Panicked);
            let _ = tx.send(result);
        })
        .map_err(|err| {
            tracing::error!(target: "orbit.scheduler", error = %err, "failed to spawn watchdog worker");
            TaskError::Panicked
        })?;

    let poll_interval = Duration::from_millis(5);
    loop {
        if cancel_token.is_cancelled() && Instant::now() < deadline {
            return Err(TaskError::Cancelled);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            cancel_token.cancel();
            tracing::warn!(
                target: "orbit.scheduler",
                timeout_ms = timeout.as_millis() as u64,
                "watchdog deadline exceeded"
            );
            return Err(TaskError::DeadlineExceeded(timeout));
        }

        match rx.recv_timeout(remaining.min(poll_interval)) {
            Ok(result) => return result,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(TaskError::Panicked),
        }
    }
}
