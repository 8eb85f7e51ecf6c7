//! Metrics registry
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Lock-free atomic increments

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for the store and the task submitter
///
/// Uses Relaxed ordering; counters are independent and only read for
/// reporting.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    records_stored: AtomicU64,
    bytes_stored: AtomicU64,
    records_evicted: AtomicU64,
    bytes_evicted: AtomicU64,
    records_rejected: AtomicU64,
    records_dropped: AtomicU64,
    store_failures: AtomicU64,
    retrievals: AtomicU64,
    compactions: AtomicU64,
    tasks_executed: AtomicU64,
    live_builds: AtomicU64,
    voice_queries: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Store metrics

    /// Record a committed insert of `bytes`
    pub fn record_stored(&self, bytes: u64) {
        self.records_stored.fetch_add(1, Ordering::Relaxed);
        self.bytes_stored.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an eviction of `bytes`
    pub fn record_evicted(&self, bytes: u64) {
        self.records_evicted.fetch_add(1, Ordering::Relaxed);
        self.bytes_evicted.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Increment records rejected by the oversize policy
    pub fn increment_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment records dropped by the oversize policy
    pub fn increment_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failed commits
    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment retrieve calls
    pub fn increment_retrievals(&self) {
        self.retrievals.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment log compactions
    pub fn increment_compactions(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    // Task metrics

    /// Increment executed mint tasks
    pub fn increment_tasks(&self) {
        self.tasks_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment simulated live builds
    pub fn increment_live_builds(&self) {
        self.live_builds.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment voice queries
    pub fn increment_voice_queries(&self) {
        self.voice_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_stored: self.records_stored.load(Ordering::Relaxed),
            bytes_stored: self.bytes_stored.load(Ordering::Relaxed),
            records_evicted: self.records_evicted.load(Ordering::Relaxed),
            bytes_evicted: self.bytes_evicted.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            retrievals: self.retrievals.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
            tasks_executed: self.tasks_executed.load(Ordering::Relaxed),
            live_builds: self.live_builds.load(Ordering::Relaxed),
            voice_queries: self.voice_queries.load(Ordering::Relaxed),
        }
    }

    /// Current snapshot as a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_stored: u64,
    pub bytes_stored: u64,
    pub records_evicted: u64,
    pub bytes_evicted: u64,
    pub records_rejected: u64,
    pub records_dropped: u64,
    pub store_failures: u64,
    pub retrievals: u64,
    pub compactions: u64,
    pub tasks_executed: u64,
    pub live_builds: u64,
    pub voice_queries: u64,
}
