//! # xds-core
//!
//! Core types and error handling for acknowledged xDS configuration pushes.
//!
//! This crate provides the vocabulary shared by the other crates:
//!
//! - [`XdsError`] - Control plane error type with gRPC status code mapping
//! - [`CompletionError`] - Cloneable outcome of a failed or abandoned push
//! - [`ResourceVersion`] - Monotonic store version numbers and their wire form
//! - [`NodeId`] / [`NodeMap`] - Identification of consuming nodes
//! - [`Resource`] - Trait for pushable resources
//! - [`TypeUrl`] - Type URL handling and constants
//!
//! ## Example
//!
//! ```rust
//! use xds_core::{AnyResource, NodeId, ResourceVersion, TypeUrl};
//!
//! let node = NodeId::new("10.0.0.1");
//! let cluster = AnyResource::from_bytes(TypeUrl::CLUSTER, "bar/foo", vec![]).boxed();
//! let version = ResourceVersion::parse_wire("version_info", "5").unwrap();
//!
//! assert_eq!(node.as_str(), "10.0.0.1");
//! assert_eq!(cluster.name(), "bar/foo");
//! assert_eq!(version.get(), 5);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod node;
mod resource;
mod type_url;
mod version;

pub use error::{CompletionError, XdsError};
pub use node::{NodeId, NodeMap};
pub use resource::{same_content, AnyResource, BoxResource, EncodeError, Resource};
pub use type_url::TypeUrl;
pub use version::ResourceVersion;

/// Result type alias using [`XdsError`].
pub type Result<T> = std::result::Result<T, XdsError>;

/// Alias for [`Result`], for call sites that also import `std::result::Result`.
pub type XdsResult<T> = Result<T>;
