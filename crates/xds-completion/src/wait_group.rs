//! Wait groups aggregating completions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use xds_core::CompletionError;

use crate::completion::{Callback, Completion};
use crate::context::WaitContext;

/// A set of completions sharing one cancellation context.
///
/// Producers hand a wait group to every operation whose effect they want to
/// observe; each operation adds a [`Completion`]. The producer then awaits
/// [`wait`](WaitGroup::wait), which returns once every completion has been
/// completed or the context has ended.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use xds_completion::WaitGroup;
///
/// # tokio_test_block_on(async {
/// let wg = WaitGroup::with_timeout(Duration::from_secs(5));
/// let c = wg.add_completion();
/// c.complete(Ok(()));
/// assert!(wg.wait().await.is_ok());
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug)]
pub struct WaitGroup {
    ctx: Arc<WaitContext>,
    pending: Mutex<Vec<Completion>>,
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitGroup {
    /// Create a wait group that only ends when canceled.
    pub fn new() -> Self {
        Self::from_context(WaitContext::background())
    }

    /// Create a wait group whose context ends after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Create a wait group whose context ends at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::from_context(WaitContext::new(Some(deadline)))
    }

    fn from_context(ctx: WaitContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn pending(&self) -> MutexGuard<'_, Vec<Completion>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a new completion to the group.
    pub fn add_completion(&self) -> Completion {
        self.add_completion_with_callback(None)
    }

    /// Add a new completion that runs `callback` when completed.
    pub fn add_completion_with_callback(&self, callback: Option<Callback>) -> Completion {
        let completion = Completion::with_context(Arc::clone(&self.ctx), callback);
        self.pending().push(completion.clone());
        completion
    }

    /// Number of completions added since the last [`wait`](WaitGroup::wait).
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Cancel the group's context.
    ///
    /// Pending completions are abandoned; their [`Completion::err`] reports
    /// [`CompletionError::Canceled`].
    pub fn cancel(&self) {
        self.ctx.cancel();
    }

    /// The deadline of the group's context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.ctx.deadline()
    }

    /// Returns the context error once the context is canceled or expired.
    pub fn err(&self) -> Option<CompletionError> {
        self.ctx.err()
    }

    /// Wait for all completions added so far.
    ///
    /// Completions are awaited in the order they were added. Returns the
    /// first completion error encountered, or the context error if the
    /// context ends first. The group's list of completions is cleared in
    /// every case, so the group can be reused for a new batch.
    pub async fn wait(&self) -> Result<(), CompletionError> {
        let pending = std::mem::take(&mut *self.pending());

        for completion in pending {
            tokio::select! {
                biased;
                result = completion.completed() => {
                    if let Err(err) = result {
                        debug!(completion = %completion, error = %err, "completion failed");
                        return Err(err);
                    }
                }
                err = self.ctx.done() => {
                    debug!(completion = %completion, error = %err, "wait group context ended");
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
