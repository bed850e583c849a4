//! Store statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for versioned store operations.
///
/// All counters are atomic and can be safely accessed from multiple threads.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Upserts that changed the store.
    upserts: AtomicU64,
    /// Deletes that changed the store.
    deletes: AtomicU64,
    /// Upserts and deletes that left the store unchanged.
    noops: AtomicU64,
    /// Reverts applied.
    reverts: AtomicU64,
    /// Version notifications delivered to watches.
    notifications_sent: AtomicU64,
}

impl StoreStats {
    /// Create new store statistics.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_upsert(&self) {
        self.upserts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_noop(&self) {
        self.noops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_revert(&self) {
        self.reverts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_notifications(&self, count: u64) {
        self.notifications_sent.fetch_add(count, Ordering::Relaxed);
    }

    /// Total changed upserts.
    #[inline]
    pub fn upserts(&self) -> u64 {
        self.upserts.load(Ordering::Relaxed)
    }

    /// Total changed deletes.
    #[inline]
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Total mutations that changed nothing.
    #[inline]
    pub fn noops(&self) -> u64 {
        self.noops.load(Ordering::Relaxed)
    }

    /// Total reverts applied.
    #[inline]
    pub fn reverts(&self) -> u64 {
        self.reverts.load(Ordering::Relaxed)
    }

    /// Total version notifications delivered.
    #[inline]
    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    /// Fraction of mutations that changed nothing (0.0 to 1.0).
    pub fn noop_rate(&self) -> f64 {
        let noops = self.noops() as f64;
        let total = noops + self.upserts() as f64 + self.deletes() as f64;
        if total == 0.0 {
            0.0
        } else {
            noops / total
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.upserts.store(0, Ordering::Relaxed);
        self.deletes.store(0, Ordering::Relaxed);
        self.noops.store(0, Ordering::Relaxed);
        self.reverts.store(0, Ordering::Relaxed);
        self.notifications_sent.store(0, Ordering::Relaxed);
    }
}
