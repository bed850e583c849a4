//! Builder for [`AckTracker`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use xds_cache::ResourceMutator;
use xds_core::{XdsError, XdsResult};

use crate::config::TrackerConfig;
use crate::metrics::{AckMetrics, XdsAckMetrics};
use crate::tracker::AckTracker;

/// Builder for [`AckTracker`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use xds_ack::{AckTracker, NoopMetrics};
/// use xds_cache::VersionedStore;
///
/// let tracker = AckTracker::builder()
///     .mutator(Arc::new(VersionedStore::new()))
///     .metrics(Arc::new(NoopMetrics))
///     .start_restoring(true)
///     .sweep_interval(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// assert!(tracker.is_restoring());
/// ```
pub struct AckTrackerBuilder<M> {
    mutator: Option<Arc<M>>,
    metrics: Option<Arc<dyn AckMetrics>>,
    config: TrackerConfig,
}

impl<M: ResourceMutator> AckTrackerBuilder<M> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            mutator: None,
            metrics: None,
            config: TrackerConfig::default(),
        }
    }

    /// Set the mutator to wrap. Required.
    pub fn mutator(mut self, mutator: Arc<M>) -> Self {
        self.mutator = Some(mutator);
        self
    }

    /// Set the metrics sink. Defaults to [`XdsAckMetrics`].
    pub fn metrics(mut self, metrics: Arc<dyn AckMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Start in restoring mode.
    pub fn start_restoring(mut self, restoring: bool) -> Self {
        self.config.start_restoring = restoring;
        self
    }

    /// Sweep abandoned completions every `interval`.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = Some(interval);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the tracker.
    ///
    /// # Errors
    ///
    /// Returns [`XdsError::Configuration`] if no mutator was set or the
    /// sweep interval is zero.
    pub fn build(self) -> XdsResult<AckTracker<M>> {
        let mutator = self
            .mutator
            .ok_or_else(|| XdsError::Configuration("mutator is required".to_string()))?;
        if self.config.sweep_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(XdsError::Configuration(
                "sweep interval must be greater than zero".to_string(),
            ));
        }
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(XdsAckMetrics::new()));
        Ok(AckTracker::from_parts(mutator, metrics, self.config))
    }
}

impl<M: ResourceMutator> Default for AckTrackerBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for AckTrackerBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AckTrackerBuilder")
            .field("has_mutator", &self.mutator.is_some())
            .field("metrics", &self.metrics)
            .field("config", &self.config)
            .finish()
    }
}
