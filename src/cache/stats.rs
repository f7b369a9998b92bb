//! Cache statistics types
//!
//! This module provides counters describing how requests were served:
//! - `HandlerStats`: Atomic counters owned by one handler instance
//! - `StatsSnapshot`: Point-in-time copy, serialisable for reporting

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time statistics for one handler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests answered from a fresh entry without touching the network
    pub hits: u64,
    /// Requests that needed the network because no usable entry existed
    pub misses: u64,
    /// Stale entries returned immediately under stale-while-revalidate
    pub stale_served: u64,
    /// Entries returned because the network call failed
    pub offline_fallbacks: u64,
    /// Background revalidations that refreshed an entry
    pub revalidations: u64,
    /// Entries removed for exceeding the retention age
    pub evictions: u64,
    /// Invalidation targets applied
    pub invalidations: u64,
    /// Full cache clears
    pub clears: u64,
}

impl StatsSnapshot {
    /// Fraction of cache-served requests among all engine requests.
    /// Returns 0.0 if there are no requests
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_served;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

/// Statistics tracker using atomics for thread safety
#[derive(Debug, Default)]
pub struct HandlerStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_served: AtomicU64,
    offline_fallbacks: AtomicU64,
    revalidations: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
    clears: AtomicU64,
}

impl HandlerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_served(&self) {
        self.stale_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_offline_fallback(&self) {
        self.offline_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_revalidation(&self) {
        self.revalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_invalidations(&self, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_served: self.stale_served.load(Ordering::Relaxed),
            offline_fallbacks: self.offline_fallbacks.load(Ordering::Relaxed),
            revalidations: self.revalidations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}
