//! Observability channel for non-fatal inconsistency observations.
//!
//! Listing operations drop entries whose source record is gone rather than
//! failing the whole call, and the write coordinator tolerates index
//! anomalies it cannot explain. Neither condition is a user-facing error,
//! but both must be visible: every occurrence is logged at `warn` level and
//! counted here. The counters are shared out of the service via
//! [`crate::CatalogService::metrics`] so monitoring (and tests) can read
//! them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for every inconsistency observation the data layer can emit.
#[derive(Debug, Default)]
pub struct ConsistencyMetrics {
    shelf_entries_dropped: AtomicU64,
    review_entries_dropped: AtomicU64,
    index_delete_anomalies: AtomicU64,
    index_write_failures: AtomicU64,
}

impl ConsistencyMetrics {
    pub(crate) fn record_shelf_entry_dropped(&self) {
        self.shelf_entries_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_review_entry_dropped(&self) {
        self.review_entries_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_delete_anomaly(&self) {
        self.index_delete_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_write_failure(&self) {
        self.index_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Shelf listing entries dropped because their book was gone.
    pub fn shelf_entries_dropped(&self) -> u64 {
        self.shelf_entries_dropped.load(Ordering::Relaxed)
    }

    /// Review listing entries dropped because their book was gone.
    pub fn review_entries_dropped(&self) -> u64 {
        self.review_entries_dropped.load(Ordering::Relaxed)
    }

    /// Review deletions that found zero or multiple index entries.
    pub fn index_delete_anomalies(&self) -> u64 {
        self.index_delete_anomalies.load(Ordering::Relaxed)
    }

    /// Review index writes that failed after the source review was durable.
    pub fn index_write_failures(&self) -> u64 {
        self.index_write_failures.load(Ordering::Relaxed)
    }

    /// Total observations across all categories.
    pub fn total(&self) -> u64 {
        self.shelf_entries_dropped()
            + self.review_entries_dropped()
            + self.index_delete_anomalies()
            + self.index_write_failures()
    }
}
