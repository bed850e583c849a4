//! Version watches for the distribution layer.
//!
//! The watch system provides:
//! - Unique watch identifiers ([`WatchId`])
//! - Per-type-URL subscriptions ([`VersionWatch`]) receiving new store versions
//! - Watch management ([`WatchManager`]) for handling multiple subscriptions
//!
//! A distribution layer holds one watch per type URL it serves and pushes
//! the resources of that type to subscribed nodes whenever a new version
//! arrives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use xds_core::TypeUrl;

/// Unique identifier for a watch subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

impl WatchId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric value of this watch ID.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// A subscription to version changes of one type URL.
///
/// Every changed mutation of a resource of the watched type delivers the
/// resulting store version. If the receiver falls behind and its buffer
/// fills, further versions are dropped until it catches up. The buffer then
/// still holds unread versions, so a receiver that re-reads the store on
/// every version it receives always ends up at the latest state.
#[derive(Debug)]
pub struct VersionWatch {
    id: WatchId,
    type_url: TypeUrl,
    receiver: mpsc::Receiver<u64>,
}

impl VersionWatch {
    /// Get the unique identifier for this watch.
    #[inline]
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Get the type URL this watch is subscribed to.
    #[inline]
    pub fn type_url(&self) -> &TypeUrl {
        &self.type_url
    }

    /// Receive the next version.
    ///
    /// Returns `None` if the watch has been cancelled.
    pub async fn recv(&mut self) -> Option<u64> {
        self.receiver.recv().await
    }

    /// Try to receive a version without waiting.
    pub fn try_recv(&mut self) -> Result<u64, mpsc::error::TryRecvError> {
        self.receiver.try_recv()
    }
}

#[derive(Debug, Clone)]
struct WatchSender {
    id: WatchId,
    sender: mpsc::Sender<u64>,
}

impl WatchSender {
    /// Returns `false` once the receiving side is gone.
    fn try_send(&self, version: u64) -> bool {
        match self.sender.try_send(version) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                trace!(watch_id = %self.id, version, "watch channel full, skipping version");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Manager for version watch subscriptions.
///
/// Uses a `Mutex` internally but operations are fast (no I/O).
#[derive(Debug)]
pub struct WatchManager {
    watches: Mutex<HashMap<TypeUrl, Vec<WatchSender>>>,
    channel_buffer: usize,
}

impl Default for WatchManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchManager {
    /// Create a new watch manager with default settings.
    pub fn new() -> Self {
        Self::with_buffer_size(16)
    }

    /// Create a new watch manager with a custom channel buffer size.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            watches: Mutex::new(HashMap::new()),
            channel_buffer: buffer_size.max(1),
        }
    }

    fn watches(&self) -> MutexGuard<'_, HashMap<TypeUrl, Vec<WatchSender>>> {
        self.watches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a new watch for a type URL.
    pub fn create_watch(&self, type_url: impl Into<TypeUrl>) -> VersionWatch {
        let type_url = type_url.into();
        let id = WatchId::next();
        let (sender, receiver) = mpsc::channel(self.channel_buffer);

        self.watches()
            .entry(type_url.clone())
            .or_default()
            .push(WatchSender { id, sender });

        debug!(watch_id = %id, type_url = %type_url, "created version watch");

        VersionWatch {
            id,
            type_url,
            receiver,
        }
    }

    /// Cancel a watch subscription.
    ///
    /// Returns `false` if the watch was unknown.
    pub fn cancel_watch(&self, watch_id: WatchId) -> bool {
        let mut watches = self.watches();

        for senders in watches.values_mut() {
            if let Some(pos) = senders.iter().position(|s| s.id == watch_id) {
                senders.swap_remove(pos);
                debug!(watch_id = %watch_id, "cancelled version watch");
                return true;
            }
        }

        warn!(watch_id = %watch_id, "attempted to cancel unknown watch");
        false
    }

    /// Deliver a new version to every watch of `type_url`.
    ///
    /// Removes closed watches and returns the number of live watches.
    pub fn notify(&self, type_url: &str, version: u64) -> usize {
        let mut watches = self.watches();
        let Some(senders) = watches.get_mut(type_url) else {
            return 0;
        };

        let before = senders.len();
        senders.retain(|sender| sender.try_send(version));
        let live = senders.len();

        if live < before {
            debug!(type_url, count = before - live, "removed closed version watches");
        }
        trace!(type_url, version, watch_count = live, "notified version watches");
        live
    }

    /// Get the number of active watches for a type URL.
    pub fn watch_count(&self, type_url: &str) -> usize {
        self.watches().get(type_url).map_or(0, Vec::len)
    }

    /// Get the total number of active watches across all type URLs.
    pub fn total_watch_count(&self) -> usize {
        self.watches().values().map(Vec::len).sum()
    }
}
