//! Background sweep of abandoned completions.
//!
//! Abandoned completions are dropped whenever an ack message is processed.
//! When nodes stop sending messages they would otherwise stay in memory;
//! the sweeper bounds that by dropping them on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};
use xds_cache::ResourceMutator;

use crate::tracker::AckTracker;

impl<M: ResourceMutator + 'static> AckTracker<M> {
    /// Spawn a task that calls [`sweep_canceled`](Self::sweep_canceled)
    /// every `interval` until `shutdown` turns `true` or its sender is
    /// dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let swept = tracker.sweep_canceled();
                        trace!(swept, "sweep tick");
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("completion sweeper stopped");
        })
    }

    /// Spawn the sweeper with the configured interval.
    ///
    /// Returns `None` when no sweep interval is configured.
    pub fn spawn_configured_sweeper(
        self: &Arc<Self>,
        shutdown: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        let interval = self.config().sweep_interval?;
        Some(self.spawn_sweeper(interval, shutdown))
    }
}
