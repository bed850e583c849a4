//! ACK/NACK metrics.
//!
//! The tracker reports every completion it resolves to an [`AckMetrics`]
//! sink. [`XdsAckMetrics`] records them as Prometheus-compatible counters
//! through the `metrics` facade:
//!
//! - `xds_acks_total{type_url}` - completions resolved by an ACK
//! - `xds_nacks_total{type_url}` - completions resolved by a NACK
//! - `xds_pending_completions` - completions still waiting after an ack
//!   message was processed

use std::fmt;

use metrics::{counter, gauge};

/// Sink for ACK/NACK events.
///
/// Methods are called with the tracker lock held; they must be cheap and
/// must not block or fail.
pub trait AckMetrics: Send + Sync + fmt::Debug {
    /// A completion for `type_url` was resolved by an ACK.
    fn increase_ack(&self, type_url: &str);

    /// A completion for `type_url` was resolved by a NACK.
    fn increase_nack(&self, type_url: &str);

    /// Number of completions still pending.
    fn record_pending(&self, _count: usize) {}
}

/// Metrics sink backed by the `metrics` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdsAckMetrics;

impl XdsAckMetrics {
    /// Create a new metrics sink.
    pub fn new() -> Self {
        Self
    }
}

impl AckMetrics for XdsAckMetrics {
    fn increase_ack(&self, type_url: &str) {
        counter!("xds_acks_total", "type_url" => type_url.to_string()).increment(1);
    }

    fn increase_nack(&self, type_url: &str) {
        counter!("xds_nacks_total", "type_url" => type_url.to_string()).increment(1);
    }

    fn record_pending(&self, count: usize) {
        gauge!("xds_pending_completions").set(count as f64);
    }
}

/// Metrics sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl AckMetrics for NoopMetrics {
    fn increase_ack(&self, _type_url: &str) {}

    fn increase_nack(&self, _type_url: &str) {}
}
