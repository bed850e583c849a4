//! Single-assignment completions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::trace;
use xds_core::CompletionError;

use crate::context::WaitContext;

/// Callback invoked with the outcome when a completion is completed.
///
/// Callbacks run synchronously inside [`Completion::complete`]. Whoever
/// completes the completion may be holding a lock, so callbacks must not
/// block and must not call back into the component that completes them.
pub type Callback = Box<dyn FnOnce(Result<(), CompletionError>) + Send + 'static>;

/// Unique identifier of a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompletionId(u64);

impl CompletionId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric value of this completion ID.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CompletionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "completion-{}", self.0)
    }
}

/// A single-assignment future signaling that a change has taken effect.
///
/// A completion is completed at most once, either successfully or with a
/// [`CompletionError`]. If its context ends first it is abandoned: nobody
/// completes it and [`err`](Completion::err) reports the context error.
///
/// `Completion` is a cheap handle; clones refer to the same completion.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<Inner>,
}

struct Inner {
    id: CompletionId,
    ctx: Arc<WaitContext>,
    result: watch::Sender<Option<Result<(), CompletionError>>>,
    callback: Mutex<Option<Callback>>,
}

impl Completion {
    pub(crate) fn with_context(ctx: Arc<WaitContext>, callback: Option<Callback>) -> Self {
        let (result, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                id: CompletionId::next(),
                ctx,
                result,
                callback: Mutex::new(callback),
            }),
        }
    }

    /// Create a completion that is not part of any wait group.
    ///
    /// Its context never ends, so it stays pending until completed.
    pub fn detached(callback: Option<Callback>) -> Self {
        Self::with_context(Arc::new(WaitContext::background()), callback)
    }

    /// Get the unique identifier of this completion.
    #[inline]
    pub fn id(&self) -> CompletionId {
        self.inner.id
    }

    /// Complete with the given outcome.
    ///
    /// Stores the outcome, wakes waiters and runs the callback, if any.
    /// Returns `false` without doing anything if the completion was
    /// already completed.
    pub fn complete(&self, result: Result<(), CompletionError>) -> bool {
        let mut stored = false;
        self.inner.result.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(result.clone());
            stored = true;
            true
        });

        if !stored {
            trace!(completion = %self.inner.id, "ignoring repeated completion");
            return false;
        }

        let callback = self
            .inner
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(callback) = callback {
            callback(result);
        }
        true
    }

    /// Check whether the completion has been completed.
    pub fn is_completed(&self) -> bool {
        self.inner.result.borrow().is_some()
    }

    /// Get the stored outcome, if completed.
    pub fn result(&self) -> Option<Result<(), CompletionError>> {
        self.inner.result.borrow().clone()
    }

    /// Poll for an error without blocking.
    ///
    /// Returns the completion error if it was completed with one. If it has
    /// not been completed yet, returns the context error once the context is
    /// canceled or past its deadline. Returns `None` otherwise.
    pub fn err(&self) -> Option<CompletionError> {
        match self.result() {
            Some(Ok(())) => None,
            Some(Err(err)) => Some(err),
            None => self.inner.ctx.err(),
        }
    }

    /// Wait until the completion is completed and return its outcome.
    ///
    /// This ignores the context; see [`WaitGroup::wait`](crate::WaitGroup::wait)
    /// for a wait bounded by cancellation and deadlines.
    pub async fn completed(&self) -> Result<(), CompletionError> {
        let mut rx = self.inner.result.subscribe();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone().unwrap_or(Ok(())),
            // The sender is owned by `self`.
            Err(_) => Err(CompletionError::Canceled),
        };
        outcome
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("id", &self.inner.id)
            .field("result", &*self.inner.result.borrow())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner.id, f)
    }
}
