use tokio_util::sync::CancellationToken;

/// Returned by a computation that observed a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("operation was cancelled")]
pub struct Cancelled;

#[inline]
pub fn check_cancelled(token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        Err(Cancelled)
    } else {
        Ok(())
    }
}
