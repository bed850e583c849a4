//! Versioned resource store.
//!
//! [`ResourceMutator`] is the mutation interface the ack tracker drives;
//! [`VersionedStore`] is its in-memory implementation. Every mutation that
//! changes the store bumps one version counter shared by all type URLs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};
use xds_core::{same_content, BoxResource, TypeUrl, XdsResult};

use crate::revert::{Revert, RevertKind};
use crate::stats::StoreStats;
use crate::watch::{VersionWatch, WatchId, WatchManager};

/// Outcome of a store mutation.
#[derive(Debug, Clone)]
pub struct Mutation {
    /// Store version after the mutation.
    pub version: u64,
    /// Whether the mutation changed the store.
    pub updated: bool,
    /// How to undo the mutation; `None` when nothing changed.
    pub revert: Option<Revert>,
}

impl Mutation {
    /// A mutation that left the store at `version`.
    pub fn unchanged(version: u64) -> Self {
        Self {
            version,
            updated: false,
            revert: None,
        }
    }
}

/// Mutation interface of a versioned resource store.
///
/// Implementations own their resources and version counter. The version
/// must increase by exactly one for every mutation that reports
/// `updated == true`, and must not change otherwise.
pub trait ResourceMutator: Send + Sync {
    /// Current store version.
    fn version(&self) -> u64;

    /// Insert or replace a resource.
    ///
    /// Reports `updated == false` if an identical resource is already stored.
    fn upsert(&self, type_url: &str, name: &str, resource: BoxResource) -> Mutation;

    /// Remove a resource.
    ///
    /// Reports `updated == false` if no such resource is stored.
    fn delete(&self, type_url: &str, name: &str) -> Mutation;

    /// Apply a revert record and return the resulting version.
    ///
    /// The default implementation re-upserts the prior value, or deletes
    /// the resource when there was none.
    fn revert(&self, revert: Revert) -> XdsResult<u64> {
        let (type_url, name, prior) = revert.into_parts();
        let mutation = match prior {
            Some(prior) => self.upsert(&type_url, &name, prior),
            None => self.delete(&type_url, &name),
        };
        Ok(mutation.version)
    }
}

/// Resources of one type together with the store version they were read at.
#[derive(Debug, Clone)]
pub struct VersionedResources {
    /// Store version at the time of the read.
    pub version: u64,
    /// Resources, ordered by name.
    pub resources: Vec<BoxResource>,
}

#[derive(Debug, Default)]
struct StoreState {
    version: u64,
    resources: HashMap<TypeUrl, BTreeMap<String, BoxResource>>,
}

/// In-memory versioned resource store.
///
/// Reads are served under the same lock that serializes mutations, so a
/// reader always sees resources together with the version that produced
/// them. Version watches are notified after the lock is released.
///
/// # Example
///
/// ```rust
/// use xds_cache::{ResourceMutator, VersionedStore};
/// use xds_core::{AnyResource, TypeUrl};
///
/// let store = VersionedStore::new();
/// let cluster = AnyResource::from_bytes(TypeUrl::CLUSTER, "bar/foo", vec![1]).boxed();
///
/// let first = store.upsert(TypeUrl::CLUSTER, "bar/foo", cluster.clone());
/// assert!(first.updated);
/// assert_eq!(first.version, 1);
///
/// // Storing the same content again changes nothing.
/// let again = store.upsert(TypeUrl::CLUSTER, "bar/foo", cluster);
/// assert!(!again.updated);
/// assert_eq!(again.version, 1);
/// ```
#[derive(Debug)]
pub struct VersionedStore {
    state: Mutex<StoreState>,
    watches: WatchManager,
    stats: StoreStats,
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionedStore {
    /// Create an empty store at version 0.
    pub fn new() -> Self {
        Self::with_watch_buffer(16)
    }

    /// Create an empty store whose version watches buffer `size` versions.
    pub fn with_watch_buffer(size: usize) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            watches: WatchManager::with_buffer_size(size),
            stats: StoreStats::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current store version.
    pub fn version(&self) -> u64 {
        self.state().version
    }

    /// Get statistics.
    #[inline]
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Get the watch manager.
    #[inline]
    pub fn watches(&self) -> &WatchManager {
        &self.watches
    }

    /// Subscribe to versions produced by changes to `type_url`.
    pub fn watch(&self, type_url: impl Into<TypeUrl>) -> VersionWatch {
        self.watches.create_watch(type_url)
    }

    /// Cancel a version watch.
    pub fn cancel_watch(&self, id: WatchId) -> bool {
        self.watches.cancel_watch(id)
    }

    /// Get one resource.
    pub fn get(&self, type_url: &str, name: &str) -> Option<BoxResource> {
        self.state()
            .resources
            .get(type_url)
            .and_then(|entries| entries.get(name))
            .cloned()
    }

    /// Read resources of a type at the current version.
    ///
    /// With empty `names` every resource of the type is returned; otherwise
    /// only the named ones that exist.
    pub fn get_resources(&self, type_url: &str, names: &[String]) -> VersionedResources {
        let state = self.state();
        let resources = match state.resources.get(type_url) {
            None => Vec::new(),
            Some(entries) if names.is_empty() => entries.values().cloned().collect(),
            Some(entries) => names
                .iter()
                .filter_map(|name| entries.get(name).cloned())
                .collect(),
        };
        VersionedResources {
            version: state.version,
            resources,
        }
    }

    /// Names of the stored resources of a type, in order.
    pub fn resource_names(&self, type_url: &str) -> Vec<String> {
        self.state()
            .resources
            .get(type_url)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of stored resources across all types.
    pub fn len(&self) -> usize {
        self.state().resources.values().map(BTreeMap::len).sum()
    }

    /// Check if the store holds no resources.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, type_url: &str, version: u64) {
        let delivered = self.watches.notify(type_url, version);
        self.stats.record_notifications(delivered as u64);
    }
}

impl ResourceMutator for VersionedStore {
    fn version(&self) -> u64 {
        VersionedStore::version(self)
    }

    fn upsert(&self, type_url: &str, name: &str, resource: BoxResource) -> Mutation {
        let mut guard = self.state();
        let state = &mut *guard;

        let entries = state.resources.entry(TypeUrl::from(type_url)).or_default();
        if let Some(existing) = entries.get(name) {
            match same_content(existing, &resource) {
                Ok(true) => {
                    self.stats.record_noop();
                    trace!(type_url, name, version = state.version, "upsert unchanged");
                    return Mutation::unchanged(state.version);
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(type_url, name, error = %err, "cannot compare resources, treating upsert as a change");
                }
            }
        }

        let prior = entries.insert(name.to_string(), resource);
        state.version += 1;
        let version = state.version;
        drop(guard);

        self.stats.record_upsert();
        debug!(type_url, name, version, created = prior.is_none(), "upserted resource");
        self.notify(type_url, version);

        Mutation {
            version,
            updated: true,
            revert: Some(Revert::new(RevertKind::Upsert, type_url, name, prior)),
        }
    }

    fn delete(&self, type_url: &str, name: &str) -> Mutation {
        let mut state = self.state();

        let removed = state
            .resources
            .get_mut(type_url)
            .and_then(|entries| entries.remove(name));
        let Some(prior) = removed else {
            self.stats.record_noop();
            trace!(type_url, name, version = state.version, "delete of missing resource");
            return Mutation::unchanged(state.version);
        };

        if state.resources.get(type_url).is_some_and(BTreeMap::is_empty) {
            state.resources.remove(type_url);
        }
        state.version += 1;
        let version = state.version;
        drop(state);

        self.stats.record_delete();
        debug!(type_url, name, version, "deleted resource");
        self.notify(type_url, version);

        Mutation {
            version,
            updated: true,
            revert: Some(Revert::new(RevertKind::Delete, type_url, name, Some(prior))),
        }
    }

    fn revert(&self, revert: Revert) -> XdsResult<u64> {
        let kind = revert.kind();
        let (type_url, name, prior) = revert.into_parts();
        let mutation = match prior {
            Some(prior) => self.upsert(&type_url, &name, prior),
            None => self.delete(&type_url, &name),
        };
        self.stats.record_revert();
        debug!(
            type_url = %type_url,
            name = %name,
            ?kind,
            version = mutation.version,
            updated = mutation.updated,
            "reverted mutation"
        );
        Ok(mutation.version)
    }
}
