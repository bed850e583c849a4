//! The ack tracker.
//!
//! [`AckTracker`] wraps a [`ResourceMutator`] and ties every mutation it
//! forwards to the acknowledgements of the nodes it targets. Mutations that
//! change the store register a pending completion; ack messages reported by
//! nodes resolve them as ACKs or NACKs.
//!
//! All operations run under one lock, including the mutation itself and
//! every completion callback. Callbacks must therefore not block and must
//! never call back into the tracker that completes them.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, trace, warn};
use xds_cache::{ResourceMutator, VersionedStore};
use xds_completion::{Callback, Completion, CompletionId, WaitGroup};
use xds_core::{BoxResource, CompletionError, NodeId, NodeMap};

use crate::builder::AckTrackerBuilder;
use crate::config::TrackerConfig;
use crate::metrics::{AckMetrics, XdsAckMetrics};
use crate::pending::PendingCompletion;
use crate::reentrancy::Held;
use crate::revert::RevertHandle;

static NEXT_TRACKER_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct Tracked {
    completion: Completion,
    pending: PendingCompletion,
}

#[derive(Debug, Default)]
struct TrackerState {
    /// Store version as of the last mutation forwarded by this tracker.
    version: u64,
    /// Highest version each node has ACKed, over all type URLs.
    acked_versions: NodeMap<u64>,
    pending: BTreeMap<CompletionId, Tracked>,
    restoring: bool,
}

impl TrackerState {
    fn acked_by_all(&self, node_ids: &[NodeId]) -> bool {
        node_ids.iter().all(|node| {
            self.acked_versions
                .get(node)
                .is_some_and(|&acked| acked >= self.version)
        })
    }
}

/// Tracker state locked by the current thread.
struct Locked<'a> {
    state: MutexGuard<'a, TrackerState>,
    _held: Held,
}

impl Deref for Locked<'_> {
    type Target = TrackerState;

    fn deref(&self) -> &TrackerState {
        &self.state
    }
}

impl DerefMut for Locked<'_> {
    fn deref_mut(&mut self) -> &mut TrackerState {
        &mut self.state
    }
}

/// Resource mutator that tracks node acknowledgements of its mutations.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use xds_ack::AckTracker;
/// use xds_cache::VersionedStore;
/// use xds_completion::WaitGroup;
/// use xds_core::{AnyResource, NodeId, TypeUrl};
///
/// let tracker = AckTracker::new(Arc::new(VersionedStore::new()));
/// let nodes = [NodeId::new("10.0.0.1")];
/// let wg = WaitGroup::new();
///
/// let cluster = AnyResource::from_bytes(TypeUrl::CLUSTER, "bar/foo", vec![1]).boxed();
/// let _revert = tracker.upsert(TypeUrl::CLUSTER, "bar/foo", cluster, &nodes, Some(&wg), None);
/// assert_eq!(tracker.pending_count(), 1);
///
/// tracker.handle_resource_version_ack(1, 1, "10.0.0.1", &["bar/foo".to_string()], TypeUrl::CLUSTER, "");
/// assert_eq!(tracker.pending_count(), 0);
/// ```
pub struct AckTracker<M = VersionedStore> {
    id: u64,
    mutator: Arc<M>,
    metrics: Arc<dyn AckMetrics>,
    config: TrackerConfig,
    state: Mutex<TrackerState>,
}

impl<M: ResourceMutator> AckTracker<M> {
    /// Create a tracker over `mutator` with default configuration and
    /// [`XdsAckMetrics`].
    pub fn new(mutator: Arc<M>) -> Self {
        Self::from_parts(mutator, Arc::new(XdsAckMetrics::new()), TrackerConfig::default())
    }

    /// Create a builder.
    pub fn builder() -> AckTrackerBuilder<M> {
        AckTrackerBuilder::new()
    }

    pub(crate) fn from_parts(
        mutator: Arc<M>,
        metrics: Arc<dyn AckMetrics>,
        config: TrackerConfig,
    ) -> Self {
        let state = TrackerState {
            version: mutator.version(),
            restoring: config.start_restoring,
            ..Default::default()
        };
        Self {
            id: NEXT_TRACKER_ID.fetch_add(1, Ordering::Relaxed),
            mutator,
            metrics,
            config,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> Locked<'_> {
        let held = Held::enter(self.id);
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Locked { state, _held: held }
    }

    /// The wrapped mutator.
    #[inline]
    pub fn mutator(&self) -> &Arc<M> {
        &self.mutator
    }

    /// The configuration this tracker was built with.
    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Store version as of the last mutation made through this tracker.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Highest version `node_id` has ACKed, if it ever ACKed anything.
    pub fn acked_version(&self, node_id: &str) -> Option<u64> {
        self.lock().acked_versions.get(node_id).copied()
    }

    /// Number of completions waiting for acknowledgements.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Check whether the tracker is in restoring mode.
    pub fn is_restoring(&self) -> bool {
        self.lock().restoring
    }

    /// Insert or replace a resource and track its acknowledgement.
    ///
    /// If the resource changed and `wg` is given, a completion is added to
    /// `wg` that succeeds once every node in `node_ids` has ACKed `name` at
    /// the new version, or fails with a NACK. `callback` is invoked with
    /// that outcome, or immediately with success when there is nothing to
    /// wait for. If the resource is unchanged this behaves like
    /// [`use_current`](Self::use_current).
    pub fn upsert(
        &self,
        type_url: &str,
        name: &str,
        resource: BoxResource,
        node_ids: &[NodeId],
        wg: Option<&WaitGroup>,
        callback: Option<Callback>,
    ) -> RevertHandle {
        let mut state = self.lock();
        let wg = Self::waiting(&state, wg, "upsert", type_url);

        let mutation = self.mutator.upsert(type_url, name, resource);
        state.version = mutation.version;

        let Some(wg) = wg else {
            run(callback);
            return RevertHandle::new(mutation.revert, type_url, node_ids);
        };
        if !mutation.updated {
            self.use_current_locked(&mut state, type_url, node_ids, wg, callback);
            return RevertHandle::noop(type_url);
        }

        trace!(type_url, name, version = mutation.version, nodes = node_ids.len(), "waiting for ACK of upsert");
        let completion = wg.add_completion_with_callback(callback);
        let pending = PendingCompletion::for_resource(type_url, mutation.version, node_ids, name);
        self.track(&mut state, completion, pending);
        RevertHandle::new(mutation.revert, type_url, node_ids)
    }

    /// Remove a resource and track the acknowledgement of the removal.
    ///
    /// A removed name no longer appears in ack messages, so the completion
    /// succeeds on any ACK of the type at or above the new version from
    /// every node in `node_ids`. Otherwise behaves like
    /// [`upsert`](Self::upsert).
    pub fn delete(
        &self,
        type_url: &str,
        name: &str,
        node_ids: &[NodeId],
        wg: Option<&WaitGroup>,
        callback: Option<Callback>,
    ) -> RevertHandle {
        let mut state = self.lock();
        let wg = Self::waiting(&state, wg, "delete", type_url);

        let mutation = self.mutator.delete(type_url, name);
        state.version = mutation.version;

        let Some(wg) = wg else {
            run(callback);
            return RevertHandle::new(mutation.revert, type_url, node_ids);
        };
        if !mutation.updated {
            self.use_current_locked(&mut state, type_url, node_ids, wg, callback);
            return RevertHandle::noop(type_url);
        }

        trace!(type_url, name, version = mutation.version, nodes = node_ids.len(), "waiting for ACK of delete");
        let completion = wg.add_completion_with_callback(callback);
        let pending = PendingCompletion::for_version(type_url, mutation.version, node_ids);
        self.track(&mut state, completion, pending);
        RevertHandle::new(mutation.revert, type_url, node_ids)
    }

    /// Wait until every node in `node_ids` has ACKed the current version.
    ///
    /// Adds a completion to `wg` unless all nodes already have.
    pub fn use_current(&self, type_url: &str, node_ids: &[NodeId], wg: Option<&WaitGroup>) {
        let mut state = self.lock();
        if let Some(wg) = Self::waiting(&state, wg, "use_current", type_url) {
            self.use_current_locked(&mut state, type_url, node_ids, wg, None);
        }
    }

    fn use_current_locked(
        &self,
        state: &mut TrackerState,
        type_url: &str,
        node_ids: &[NodeId],
        wg: &WaitGroup,
        callback: Option<Callback>,
    ) {
        if state.acked_by_all(node_ids) {
            trace!(type_url, version = state.version, "current version already ACKed");
            run(callback);
            return;
        }
        let completion = wg.add_completion_with_callback(callback);
        let pending = PendingCompletion::for_version(type_url, state.version, node_ids);
        self.track(state, completion, pending);
    }

    /// Apply a revert handle.
    ///
    /// Given a completion, it is completed once every node the original
    /// mutation targeted ACKs anything of the type at or above the resulting
    /// version. If the mutator fails to revert, the completion waits on the
    /// current version instead.
    pub fn revert(&self, handle: RevertHandle, completion: Option<Completion>) {
        let Some(revert) = handle.revert else {
            if let Some(completion) = completion {
                completion.complete(Ok(()));
            }
            return;
        };

        let mut state = self.lock();
        match self.mutator.revert(revert) {
            Ok(version) => state.version = version,
            // The completion still waits, at the last version this tracker saw.
            Err(err) => warn!(type_url = %handle.type_url, error = %err, "failed to revert mutation"),
        }

        if let Some(completion) = completion {
            let pending = PendingCompletion::for_version(&handle.type_url, state.version, &handle.node_ids);
            self.track(&mut state, completion, pending);
        }
    }

    /// Forget what `node_id` has ACKed.
    ///
    /// Call when a node disconnects for good. Pending completions that
    /// target the node are left untouched.
    pub fn delete_node(&self, node_id: &str) {
        if self.lock().acked_versions.remove(node_id).is_some() {
            debug!(node = node_id, "forgot acked version of node");
        }
    }

    /// Enter restoring mode: mutations stop registering completions.
    pub fn mark_restore_pending(&self) {
        self.lock().restoring = true;
        debug!("restore pending, not waiting for ACKs");
    }

    /// Leave restoring mode.
    pub fn mark_restore_completed(&self) {
        self.lock().restoring = false;
        debug!("restore completed");
    }

    /// Process an ack message from a node.
    ///
    /// `ack_version` is the last version the node applied cleanly,
    /// `nack_version` the last one it attempted. Pending completions for
    /// `type_url` at or below `nack_version` that target the node count the
    /// message; once a completion has heard from all its nodes it succeeds
    /// if its version is at or below `ack_version`, and fails with a NACK
    /// carrying `detail` otherwise. Abandoned completions are dropped.
    pub fn handle_resource_version_ack(
        &self,
        ack_version: u64,
        nack_version: u64,
        node_id: &str,
        resource_names: &[String],
        type_url: &str,
        detail: &str,
    ) {
        let nack_version = nack_version.max(ack_version);
        let mut guard = self.lock();
        let state = &mut *guard;

        if let Some(acked) = state.acked_versions.get_mut(node_id) {
            if *acked < ack_version {
                *acked = ack_version;
            }
        } else {
            state.acked_versions.insert(NodeId::new(node_id), ack_version);
        }
        trace!(node = node_id, type_url, ack_version, nack_version, "ack message");

        let mut resolved = Vec::new();
        state.pending.retain(|id, tracked| {
            if tracked.completion.is_completed() {
                return false;
            }
            if let Some(err) = tracked.completion.err() {
                debug!(completion = %id, error = %err, "dropping abandoned completion");
                return false;
            }
            if tracked.pending.matches(type_url, nack_version) && tracked.pending.observe(node_id, resource_names) {
                resolved.push(*id);
            }
            true
        });

        // Removed one at a time so a panicking callback leaves the rest pending.
        for id in resolved {
            if let Some(tracked) = state.pending.remove(&id) {
                self.resolve(tracked, node_id, ack_version, detail);
            }
        }
        self.metrics.record_pending(state.pending.len());
    }

    fn resolve(&self, tracked: Tracked, node_id: &str, ack_version: u64, detail: &str) {
        let Tracked { completion, pending } = tracked;
        let version = pending.version();
        let type_url = pending.type_url();

        if version <= ack_version {
            debug!(node = node_id, type_url, version, completion = %completion, "completing ACK");
            self.metrics.increase_ack(type_url);
            completion.complete(Ok(()));
        } else {
            warn!(node = node_id, type_url, version, ack_version, detail, "completing NACK");
            self.metrics.increase_nack(type_url);
            completion.complete(Err(CompletionError::Nack {
                type_url: type_url.to_string(),
                version,
                detail: detail.to_string(),
            }));
        }
    }

    /// Drop pending completions whose context has ended.
    ///
    /// Returns the number of completions dropped.
    pub fn sweep_canceled(&self) -> usize {
        let mut state = self.lock();
        let before = state.pending.len();
        state
            .pending
            .retain(|_, tracked| !tracked.completion.is_completed() && tracked.completion.err().is_none());
        let swept = before - state.pending.len();
        if swept > 0 {
            debug!(swept, remaining = state.pending.len(), "swept abandoned completions");
            self.metrics.record_pending(state.pending.len());
        }
        swept
    }

    /// The wait group to register with, unless restoring.
    fn waiting<'w>(
        state: &TrackerState,
        wg: Option<&'w WaitGroup>,
        operation: &'static str,
        type_url: &str,
    ) -> Option<&'w WaitGroup> {
        let wg = wg?;
        if state.restoring {
            debug!(operation, type_url, "restoring, not waiting for ACK");
            return None;
        }
        Some(wg)
    }

    fn track(&self, state: &mut TrackerState, completion: Completion, pending: PendingCompletion) {
        let id = completion.id();
        if state.pending.contains_key(&id) {
            error!(completion = %id, type_url = pending.type_url(), version = pending.version(), "completion is already pending");
            panic!("attempt to reuse {id} to wait for a resource version");
        }
        if pending.is_satisfied() {
            trace!(completion = %id, "no nodes to wait for");
            completion.complete(Ok(()));
            return;
        }
        state.pending.insert(id, Tracked { completion, pending });
        self.metrics.record_pending(state.pending.len());
    }
}

fn run(callback: Option<Callback>) {
    if let Some(callback) = callback {
        callback(Ok(()));
    }
}

impl<M> std::fmt::Debug for AckTracker<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AckTracker")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}
