//! Bookkeeping for one registered completion.

use std::collections::HashSet;

use xds_core::{NodeId, NodeMap};

/// What a completion is waiting for.
///
/// For each target node the value is the set of resource names that node
/// still has to ACK, or `None` when any ACK of the type at or above
/// `version` satisfies it.
#[derive(Debug, Clone)]
pub(crate) struct PendingCompletion {
    version: u64,
    type_url: String,
    remaining: NodeMap<Option<HashSet<String>>>,
}

impl PendingCompletion {
    /// Wait until every node ACKs `name`.
    pub(crate) fn for_resource(type_url: &str, version: u64, nodes: &[NodeId], name: &str) -> Self {
        Self::build(type_url, version, nodes, || Some(HashSet::from([name.to_string()])))
    }

    /// Wait until every node ACKs anything of the type.
    pub(crate) fn for_version(type_url: &str, version: u64, nodes: &[NodeId]) -> Self {
        Self::build(type_url, version, nodes, || None)
    }

    fn build(
        type_url: &str,
        version: u64,
        nodes: &[NodeId],
        names: impl Fn() -> Option<HashSet<String>>,
    ) -> Self {
        Self {
            version,
            type_url: type_url.to_string(),
            remaining: nodes.iter().map(|node| (node.clone(), names())).collect(),
        }
    }

    #[inline]
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub(crate) fn type_url(&self) -> &str {
        &self.type_url
    }

    /// Whether no node is left to wait for.
    #[inline]
    pub(crate) fn is_satisfied(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Number of nodes still outstanding.
    #[inline]
    pub(crate) fn remaining_nodes(&self) -> usize {
        self.remaining.len()
    }

    /// Whether an ack message for this type and a given version range concerns
    /// this completion at all.
    #[inline]
    pub(crate) fn matches(&self, type_url: &str, nack_version: u64) -> bool {
        self.type_url == type_url && self.version <= nack_version
    }

    /// Record an ACK of `resource_names` from `node`.
    ///
    /// Returns `true` when this ACK was the last one the completion waited
    /// for. Nodes that are not targets are ignored.
    pub(crate) fn observe(&mut self, node: &str, resource_names: &[String]) -> bool {
        let Some(remaining) = self.remaining.get_mut(node) else {
            return false;
        };
        let node_done = match remaining {
            None => true,
            Some(names) => {
                for name in resource_names {
                    names.remove(name);
                }
                names.is_empty()
            }
        };
        if node_done {
            self.remaining.remove(node);
        }
        self.remaining.is_empty()
    }
}
