//! Age-based eviction of cached entries.
//!
//! Three entry points share one rule, `age >= max_age`:
//! - reactive: the strategy engine deletes an over-age entry when it reads it
//! - periodic: the handler sweeps the whole cache on the first GET it sees
//!   and again every `SWEEP_INTERVAL` GETs, off the request path
//! - manual: `sweep_expired` can be called directly, e.g. from a lifecycle hook
//!
//! Sweeps are best-effort. Store failures are logged and skipped.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;

use crate::cache::{is_expired_for_retention, now_millis, Cache, CacheKey, CacheStorage};
use crate::constants::SWEEP_INTERVAL;

/// Sweep the named cache, returning how many entries were deleted
pub async fn sweep_expired(storage: &dyn CacheStorage, cache_name: &str, max_age_seconds: u64) -> usize {
    match storage.open(cache_name).await {
        Ok(cache) => sweep_cache(cache.as_ref(), max_age_seconds, now_millis()).await,
        Err(e) => {
            tracing::warn!(cache = cache_name, error = %e, "Eviction sweep could not open cache");
            0
        }
    }
}

/// Sweep one cache as of `now_ms`
pub async fn sweep_cache(cache: &dyn Cache, max_age_seconds: u64, now_ms: u64) -> usize {
    let keys = match cache.keys().await {
        Ok(keys) => keys,
        Err(e) => {
            tracing::warn!(error = %e, "Eviction sweep could not list keys");
            return 0;
        }
    };
    let scanned = keys.len();

    let results = join_all(
        keys.into_iter()
            .map(|key| evict_if_expired(cache, key, max_age_seconds, now_ms)),
    )
    .await;
    let deleted = results.into_iter().filter(|deleted| *deleted).count();

    tracing::debug!(scanned, deleted, max_age = max_age_seconds, "Eviction sweep finished");
    deleted
}

async fn evict_if_expired(cache: &dyn Cache, key: CacheKey, max_age_seconds: u64, now_ms: u64) -> bool {
    let entry = match cache.get(&key).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return false,
        Err(e) => {
            tracing::warn!(url = %key, error = %e, "Eviction sweep could not read entry");
            return false;
        }
    };
    if !is_expired_for_retention(&entry, max_age_seconds, now_ms) {
        return false;
    }
    match cache.delete(&key).await {
        Ok(deleted) => deleted,
        Err(e) => {
            tracing::warn!(url = %key, error = %e, "Eviction sweep could not delete entry");
            false
        }
    }
}

/// Counts GET requests for one handler and decides when a periodic sweep is due.
///
/// Sweeps fire on the first request and then every `SWEEP_INTERVAL` requests
/// after each sweep. The count lives in memory only and restarts with the process.
#[derive(Debug, Default)]
pub struct SweepCounter {
    count: AtomicU64,
}

impl SweepCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request; returns true if a sweep should run now
    pub fn tick(&self) -> bool {
        let current = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if current == 1 {
            return true;
        }
        if current > SWEEP_INTERVAL {
            self.count.store(1, Ordering::SeqCst);
            return true;
        }
        false
    }

    pub fn current(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}
