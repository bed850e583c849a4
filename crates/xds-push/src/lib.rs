//! # xds-push
//!
//! Acknowledged configuration pushes for xDS control planes.
//!
//! A control plane that pushes configuration to proxies usually needs to
//! know when a change has actually taken effect: every targeted proxy has
//! applied it (ACK), or one of them rejected it (NACK). This library tracks
//! that for a versioned resource store:
//!
//! - every change to the store produces a new version
//! - proxies report the versions they applied or rejected
//! - callers wait on completions for the versions their changes produced
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use xds_push::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(VersionedStore::new());
//! let tracker = AckTracker::new(Arc::clone(&store));
//! let proxies = [NodeId::new("10.0.0.1"), NodeId::new("10.0.0.2")];
//!
//! let wg = WaitGroup::new();
//! let cluster = AnyResource::from_bytes(TypeUrl::CLUSTER, "bar/foo", vec![1]).boxed();
//! let _revert = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster, &proxies, Some(&wg), None);
//!
//! // Both proxies report version 1 in their next discovery request.
//! for proxy in &proxies {
//!     let ack = AckMessage::from_request(
//!         proxy.clone(),
//!         TypeUrl::CLUSTER,
//!         "1",
//!         "1",
//!         vec!["bar/foo".to_string()],
//!         None,
//!     )
//!     .unwrap();
//!     tracker.observe(&ack);
//! }
//!
//! wg.wait().await.unwrap();
//! # }
//! ```
//!
//! ## Architecture
//!
//! This library is organized into several crates:
//!
//! - `xds-core` - Core types and error handling
//! - `xds-completion` - Completions and wait groups
//! - `xds-cache` - Versioned resource store with version watches
//! - `xds-ack` - ACK/NACK tracking
//!
//! This crate (`xds-push`) re-exports all public APIs for convenience.
//!
//! ## Design Principles
//!
//! 1. **One lock per tracker** - Mutations, ack handling and callbacks are
//!    serialized; callbacks must not call back into the tracker
//! 2. **Reverts are data** - Undoing a change never captures locks
//! 3. **Caller owns retries** - NACK details are surfaced verbatim, nothing
//!    is retried automatically
//! 4. **Observable** - Built-in metrics and tracing support

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Re-export all sub-crates
pub use xds_ack as ack;
pub use xds_cache as cache;
pub use xds_completion as completion;
pub use xds_core as core;

/// Prelude module for convenient imports.
///
/// ```rust
/// use xds_push::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use xds_core::{
        AnyResource, BoxResource, CompletionError, NodeId, Resource, ResourceVersion, TypeUrl,
        XdsError, XdsResult,
    };

    // Completion types
    pub use xds_completion::{Callback, Completion, WaitGroup};

    // Store types
    pub use xds_cache::{ResourceMutator, StoreStats, VersionWatch, VersionedStore};

    // Tracker types
    pub use xds_ack::{
        AckMessage, AckMetrics, AckTracker, AckTrackerBuilder, ResourceVersionAckObserver,
        RevertHandle, RevertList, TrackerConfig,
    };
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Minimum supported Rust version.
    pub const MSRV: &str = "1.75";

    /// Get version info as a string.
    pub fn version_string() -> String {
        format!("xds-push {} (MSRV {})", VERSION, MSRV)
    }
}
