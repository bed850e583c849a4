//! Handles for undoing tracked mutations.

use xds_cache::{ResourceMutator, Revert};
use xds_completion::WaitGroup;
use xds_core::NodeId;

use crate::tracker::AckTracker;

/// Undo information for one tracked mutation.
///
/// Returned by [`AckTracker::upsert`] and [`AckTracker::delete`] and applied
/// with [`AckTracker::revert`]. A handle for a mutation that changed nothing
/// is a no-op.
#[derive(Debug, Clone)]
#[must_use = "dropping a revert handle makes the mutation impossible to undo"]
pub struct RevertHandle {
    pub(crate) revert: Option<Revert>,
    pub(crate) type_url: String,
    pub(crate) node_ids: Vec<NodeId>,
}

impl RevertHandle {
    pub(crate) fn new(revert: Option<Revert>, type_url: &str, node_ids: &[NodeId]) -> Self {
        Self {
            revert,
            type_url: type_url.to_string(),
            node_ids: node_ids.to_vec(),
        }
    }

    /// A handle that undoes nothing.
    pub fn noop(type_url: &str) -> Self {
        Self::new(None, type_url, &[])
    }

    /// Check whether applying this handle changes nothing.
    pub fn is_noop(&self) -> bool {
        self.revert.is_none()
    }

    /// The revert record, if any.
    pub fn revert_record(&self) -> Option<&Revert> {
        self.revert.as_ref()
    }

    /// Type URL of the mutated resource.
    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    /// Nodes the mutation targeted.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }
}

/// Ordered collection of revert handles.
///
/// Collects the handles of a multi-step change so it can be rolled back as a
/// whole: [`revert_all`](RevertList::revert_all) undoes the steps in reverse.
#[derive(Debug, Default)]
pub struct RevertList {
    handles: Vec<RevertHandle>,
}

impl RevertList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handle.
    pub fn push(&mut self, handle: RevertHandle) {
        self.handles.push(handle);
    }

    /// Number of handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Revert every handle, last first.
    ///
    /// With a wait group, one completion per handle is added to it, each
    /// completed once the reverted version is ACKed.
    pub fn revert_all<M: ResourceMutator>(self, tracker: &AckTracker<M>, wg: Option<&WaitGroup>) {
        for handle in self.handles.into_iter().rev() {
            let completion = wg.map(WaitGroup::add_completion);
            tracker.revert(handle, completion);
        }
    }
}

impl Extend<RevertHandle> for RevertList {
    fn extend<I: IntoIterator<Item = RevertHandle>>(&mut self, iter: I) {
        self.handles.extend(iter);
    }
}

impl FromIterator<RevertHandle> for RevertList {
    fn from_iter<I: IntoIterator<Item = RevertHandle>>(iter: I) -> Self {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}
