//! # xds-ack
//!
//! ACK/NACK tracking for pushes of versioned xDS resources.
//!
//! - [`AckTracker`] - Wraps a [`ResourceMutator`](xds_cache::ResourceMutator)
//!   and resolves completions once targeted nodes acknowledge the versions
//!   that mutations produced
//! - [`AckMessage`] / [`ResourceVersionAckObserver`] - Inbound side: what a
//!   node reports in its discovery requests
//! - [`RevertHandle`] / [`RevertList`] - Undo tracked mutations, e.g. after a
//!   NACK or timeout
//! - [`AckMetrics`] - Counters for resolved ACKs and NACKs
//!
//! ## Protocol
//!
//! Every mutation that changes the store produces a new global version. A
//! mutation made with a [`WaitGroup`](xds_completion::WaitGroup) adds a
//! completion that waits for each target node to report that version:
//!
//! - a node ACKs version `v` when it reports `ack_version >= v`
//! - a node NACKs version `v` when it reports
//!   `ack_version < v <= nack_version`, with an error detail
//!
//! A completion is resolved by the ack message that satisfies its last
//! outstanding node. It succeeds when that message ACKs the version and
//! fails with [`CompletionError::Nack`](xds_core::CompletionError::Nack)
//! otherwise.
//!
//! While the tracker is restoring (see
//! [`mark_restore_pending`](AckTracker::mark_restore_pending)) mutations are
//! applied without waiting for anything.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xds_ack::{AckMessage, AckTracker, ResourceVersionAckObserver};
//! use xds_cache::VersionedStore;
//! use xds_completion::WaitGroup;
//! use xds_core::{AnyResource, NodeId, TypeUrl};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let tracker = AckTracker::new(Arc::new(VersionedStore::new()));
//! let nodes = [NodeId::new("10.0.0.1")];
//!
//! let wg = WaitGroup::new();
//! let cluster = AnyResource::from_bytes(TypeUrl::CLUSTER, "bar/foo", vec![1]).boxed();
//! let revert = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster, &nodes, Some(&wg), None);
//!
//! // The node rejects version 1.
//! let nack = AckMessage::from_request(
//!     "10.0.0.1",
//!     TypeUrl::CLUSTER,
//!     "0",
//!     "1",
//!     vec!["bar/foo".to_string()],
//!     Some("unknown field"),
//! )
//! .unwrap();
//! tracker.observe(&nack);
//!
//! let err = wg.wait().await.unwrap_err();
//! assert!(err.is_nack());
//! tracker.revert(revert, None);
//! assert_eq!(tracker.version(), 2);
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod metrics;
mod observer;
mod pending;
mod reentrancy;
mod revert;
mod sweeper;
mod tracker;

pub use builder::AckTrackerBuilder;
pub use config::TrackerConfig;
pub use metrics::{AckMetrics, NoopMetrics, XdsAckMetrics};
pub use observer::{AckMessage, ResourceVersionAckObserver};
pub use revert::{RevertHandle, RevertList};
pub use tracker::AckTracker;
