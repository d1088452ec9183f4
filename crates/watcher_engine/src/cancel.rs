//! Cancellation primitives for the two run styles.
//!
//! [`CancelToken`] is polled by the sequential runner between steps and never
//! interrupts a call. [`AbortSignal`] is handed to a single in-flight call,
//! which races it against its own completion.

use std::future::Future;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::types::Abortable;

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: CancellationToken,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_cancel(&self) {
        self.inner.cancel();
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.inner.is_cancelled()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    inner: CancellationToken,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.inner.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolves once [`AbortSignal::abort`] has been called on any clone.
    pub fn aborted(&self) -> WaitForCancellationFuture<'_> {
        self.inner.cancelled()
    }
}

/// Runs `call` until it completes or `signal` fires, whichever happens first.
///
/// When the signal wins, `call` is dropped, which cancels any request it had in flight.
pub async fn race_abort<F>(signal: &AbortSignal, call: F) -> Abortable<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = signal.aborted() => Abortable::Aborted,
        output = call => Abortable::Completed(output),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn abort_wins_over_a_pending_call() {
        let signal = AbortSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.abort();
        });
        let outcome = race_abort(&signal, std::future::pending::<()>()).await;
        assert_eq!(outcome, Abortable::Aborted);
    }

    #[tokio::test]
    async fn completed_call_is_reported_when_signal_stays_quiet() {
        let signal = AbortSignal::new();
        let outcome = race_abort(&signal, async { 7 }).await;
        assert_eq!(outcome, Abortable::Completed(7));
        assert!(!signal.is_aborted());
    }

    #[test]
    fn cancel_token_clones_share_the_flag() {
        let token = CancelToken::new();
        let ui_side = token.clone();
        assert!(!token.is_cancel_requested());
        ui_side.request_cancel();
        assert!(token.is_cancel_requested());
    }
}
