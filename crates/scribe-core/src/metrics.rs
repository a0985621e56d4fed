//! Pipeline counters.
//!
//! One [`PipelineMetrics`] instance is shared (via `Arc`) between the
//! enqueuer, the workers and the stats endpoint. Counters are monotonic;
//! rates are derived by whoever scrapes the snapshot.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters for every pipeline stage.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    enqueued: AtomicU64,
    rejected: AtomicU64,
    leased: AtomicU64,
    acknowledged: AtomicU64,
    released: AtomicU64,
    dead_lettered: AtomicU64,
    stored: AtomicU64,
    duplicate_deliveries: AtomicU64,
    integrity_conflicts: AtomicU64,
    indexed: AtomicU64,
    index_failures: AtomicU64,
    reindex_scheduled: AtomicU64,
    reindexed: AtomicU64,
}

impl PipelineMetrics {
    /// Create a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record envelopes accepted and published.
    pub fn record_enqueued(&self, count: u64) {
        self.enqueued.fetch_add(count, Ordering::Relaxed);
    }

    /// Record submissions rejected before publishing.
    pub fn record_rejected(&self, count: u64) {
        self.rejected.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a lease handed to a worker.
    pub fn record_lease(&self) {
        self.leased.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message acknowledged.
    pub fn record_ack(&self) {
        self.acknowledged.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message released for retry.
    pub fn record_release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message dead-lettered.
    pub fn record_dead_letter(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an entry newly written to the primary store.
    pub fn record_stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a delivery whose entry was already stored.
    pub fn record_duplicate(&self) {
        self.duplicate_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upsert that collided with different stored content.
    pub fn record_conflict(&self) {
        self.integrity_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an entry indexed for search.
    pub fn record_indexed(&self) {
        self.indexed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed index write.
    pub fn record_index_failure(&self) {
        self.index_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a re-index request scheduled.
    pub fn record_reindex_scheduled(&self) {
        self.reindex_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a re-index completed.
    pub fn record_reindexed(&self) {
        self.reindexed.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            leased: self.leased.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            duplicate_deliveries: self.duplicate_deliveries.load(Ordering::Relaxed),
            integrity_conflicts: self.integrity_conflicts.load(Ordering::Relaxed),
            indexed: self.indexed.load(Ordering::Relaxed),
            index_failures: self.index_failures.load(Ordering::Relaxed),
            reindex_scheduled: self.reindex_scheduled.load(Ordering::Relaxed),
            reindexed: self.reindexed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub enqueued: u64,
    pub rejected: u64,
    pub leased: u64,
    pub acknowledged: u64,
    pub released: u64,
    pub dead_lettered: u64,
    pub stored: u64,
    pub duplicate_deliveries: u64,
    pub integrity_conflicts: u64,
    pub indexed: u64,
    pub index_failures: u64,
    pub reindex_scheduled: u64,
    pub reindexed: u64,
}
