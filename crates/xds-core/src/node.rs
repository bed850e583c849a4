//! Node identification for acknowledgement tracking.
//!
//! This module provides [`NodeId`], the identifier of a consuming node
//! (typically the IP address of a proxy instance, e.g. `"10.0.0.1"`), and
//! [`NodeMap`], the FNV-hashed map used to key per-node state.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

use fnv::FnvHasher;

/// Map keyed by [`NodeId`] using FNV-1a hashing.
///
/// Node identifiers are short strings, which FNV hashes faster than SipHash.
pub type NodeMap<V> = HashMap<NodeId, V, BuildHasherDefault<FnvHasher>>;

/// Identifier of a node that consumes pushed configuration.
///
/// Cloning a `NodeId` is cheap: the string is shared.
///
/// # Example
///
/// ```rust
/// use xds_core::NodeId;
///
/// let node = NodeId::new("10.0.0.1");
/// assert_eq!(node.as_str(), "10.0.0.1");
/// assert_eq!(node, NodeId::from("10.0.0.1"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Create a node identifier.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:?})", &*self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
