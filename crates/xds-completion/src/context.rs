//! Cancellation context shared by a wait group and its completions.

use tokio::sync::watch;
use tokio::time::Instant;
use xds_core::CompletionError;

/// Cancellation and deadline state of a wait group.
///
/// The context is done once it is canceled or its deadline has passed.
/// Completions poll it without blocking through [`WaitContext::err`].
#[derive(Debug)]
pub(crate) struct WaitContext {
    canceled: watch::Sender<bool>,
    deadline: Option<Instant>,
}

impl WaitContext {
    pub(crate) fn new(deadline: Option<Instant>) -> Self {
        let (canceled, _) = watch::channel(false);
        Self { canceled, deadline }
    }

    /// A context that only ends when canceled.
    pub(crate) fn background() -> Self {
        Self::new(None)
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(crate) fn cancel(&self) {
        self.canceled.send_replace(true);
    }

    /// Returns the context error once the context is done.
    pub(crate) fn err(&self) -> Option<CompletionError> {
        if *self.canceled.borrow() {
            return Some(CompletionError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CompletionError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves with the context error when the context ends.
    pub(crate) async fn done(&self) -> CompletionError {
        let mut rx = self.canceled.subscribe();
        let canceled = async move {
            // The sender lives as long as `self`, so this only returns on cancel.
            let _ = rx.wait_for(|canceled| *canceled).await;
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = canceled => CompletionError::Canceled,
                () = tokio::time::sleep_until(deadline) => CompletionError::DeadlineExceeded,
            },
            None => {
                canceled.await;
                CompletionError::Canceled
            }
        }
    }
}
