//! # xds-cache
//!
//! Versioned resource store for acknowledged configuration pushes.
//!
//! This crate provides the storage layer the ack tracker mutates:
//!
//! - [`ResourceMutator`] - Mutation interface (upsert, delete, revert)
//! - [`VersionedStore`] - In-memory store with one global version counter
//! - [`Revert`] - Plain-data record of how to undo a mutation
//! - [`VersionWatch`] - Per-type-URL subscription to new versions, for the
//!   distribution layer that pushes resources to nodes
//!
//! ## Key Design Decisions
//!
//! - A version is bumped only by mutations that change stored content;
//!   upserting identical content is a no-op
//! - Versions are shared by all type URLs of a store, giving a total order
//!   of changes
//! - Reverts are data, not closures, so they hold no locks or references
//!
//! ## Example
//!
//! ```rust
//! use xds_cache::{ResourceMutator, VersionedStore};
//! use xds_core::{AnyResource, TypeUrl};
//!
//! let store = VersionedStore::new();
//! let listener = AnyResource::from_bytes(TypeUrl::LISTENER, "http", vec![]).boxed();
//!
//! let upsert = store.upsert(TypeUrl::LISTENER, "http", listener);
//! assert_eq!(upsert.version, 1);
//!
//! // Undo it: the listener is removed again at a new version.
//! let version = store.revert(upsert.revert.unwrap()).unwrap();
//! assert_eq!(version, 2);
//! assert!(store.get(TypeUrl::LISTENER, "http").is_none());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod revert;
mod stats;
mod store;
mod watch;

pub use revert::{Revert, RevertKind};
pub use stats::StoreStats;
pub use store::{Mutation, ResourceMutator, VersionedResources, VersionedStore};
pub use watch::{VersionWatch, WatchId, WatchManager};
