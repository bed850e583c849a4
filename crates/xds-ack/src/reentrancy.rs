//! Debug-build detection of callbacks re-entering a tracker.
//!
//! Completion callbacks run under the tracker lock. A callback that calls
//! back into the same tracker would deadlock on that lock; in debug builds
//! the re-entry panics instead, naming the cause.

#[cfg(debug_assertions)]
use std::cell::RefCell;

#[cfg(debug_assertions)]
thread_local! {
    static HELD: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Marks a tracker as locked by the current thread for its lifetime.
#[derive(Debug)]
pub(crate) struct Held {
    #[cfg(debug_assertions)]
    tracker: u64,
}

impl Held {
    /// Must be called before acquiring the tracker lock.
    pub(crate) fn enter(tracker: u64) -> Self {
        #[cfg(debug_assertions)]
        {
            let reentered = HELD.with(|held| {
                let mut held = held.borrow_mut();
                if held.contains(&tracker) {
                    return true;
                }
                held.push(tracker);
                false
            });
            assert!(
                !reentered,
                "ack tracker re-entered while locked: completion callbacks run under the tracker lock and must not call back into the tracker"
            );
            Self { tracker }
        }
        #[cfg(not(debug_assertions))]
        {
            let _ = tracker;
            Self {}
        }
    }
}

impl Drop for Held {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|&t| t == self.tracker) {
                held.swap_remove(pos);
            }
        });
    }
}
