//! Tracker configuration.

use std::time::Duration;

/// Configuration for an [`AckTracker`](crate::AckTracker).
#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    /// Start in restoring mode.
    ///
    /// Set this when the store is pre-populated before any node connects;
    /// call [`mark_restore_completed`](crate::AckTracker::mark_restore_completed)
    /// once restoration is done.
    pub start_restoring: bool,
    /// Interval of the background sweep of abandoned completions.
    ///
    /// `None` disables the sweeper: abandoned completions are then only
    /// dropped when the next ack message is processed.
    pub sweep_interval: Option<Duration>,
}

impl TrackerConfig {
    /// Configuration that starts in restoring mode.
    pub fn restoring() -> Self {
        Self {
            start_restoring: true,
            ..Default::default()
        }
    }
}
