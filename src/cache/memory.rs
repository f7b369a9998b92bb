//! Memory cache implementation
//!
//! This module provides the in-process response store:
//! - `MemoryCache`: one named cache backed by moka
//! - `MemoryCacheStorage`: registry of named `MemoryCache`s
//!
//! Moka is used without a TTL. Entries only leave through explicit deletes,
//! cache drops, the capacity bound, or the eviction sweeper.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::entry::{CacheKey, CachedResponse};
use super::error::CacheError;
use super::traits::{Cache, CacheStorage};

/// MemoryCache wraps moka for our Cache trait
pub struct MemoryCache {
    entries: moka::future::Cache<CacheKey, CachedResponse>,
}

impl MemoryCache {
    /// Create an unbounded cache
    pub fn new() -> Self {
        Self {
            entries: moka::future::Cache::builder().build(),
        }
    }

    /// Create a cache holding at most `max_entries` responses
    pub fn with_max_entries(max_entries: u64) -> Self {
        Self {
            entries: moka::future::Cache::builder()
                .max_capacity(max_entries)
                .build(),
        }
    }

    /// Keys sharing `key`'s origin and path
    fn path_variants(&self, key: &CacheKey) -> Vec<CacheKey> {
        self.entries
            .iter()
            .filter(|(k, _)| k.same_path(key))
            .map(|(k, _)| (*k).clone())
            .collect()
    }

    /// Drop every entry and wait for moka to settle
    pub async fn clear_all(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        Ok(self.entries.get(key).await)
    }

    async fn get_ignoring_query(&self, key: &CacheKey) -> Result<Vec<CachedResponse>, CacheError> {
        Ok(self
            .entries
            .iter()
            .filter(|(k, _)| k.same_path(key))
            .map(|(_, v)| v)
            .collect())
    }

    async fn put(&self, key: CacheKey, entry: CachedResponse) -> Result<(), CacheError> {
        self.entries.insert(key, entry).await;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).await.is_some())
    }

    async fn delete_ignoring_query(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let mut deleted = false;
        for variant in self.path_variants(key) {
            deleted |= self.entries.remove(&variant).await.is_some();
        }
        Ok(deleted)
    }

    async fn keys(&self) -> Result<Vec<CacheKey>, CacheError> {
        Ok(self.entries.iter().map(|(k, _)| (*k).clone()).collect())
    }
}

/// Registry of named in-memory caches
pub struct MemoryCacheStorage {
    caches: RwLock<HashMap<String, Arc<MemoryCache>>>,
    max_entries: Option<u64>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            max_entries: None,
        }
    }

    /// Bound every cache opened through this storage to `max_entries`
    pub fn with_max_entries(max_entries: u64) -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            max_entries: Some(max_entries),
        }
    }

    /// Names of the caches currently open
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn open_or_create(&self, name: &str) -> Arc<MemoryCache> {
        if let Some(cache) = self.caches.read().get(name) {
            return cache.clone();
        }
        let mut caches = self.caches.write();
        caches
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(match self.max_entries {
                    Some(max) => MemoryCache::with_max_entries(max),
                    None => MemoryCache::new(),
                })
            })
            .clone()
    }
}

impl Default for MemoryCacheStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError> {
        if name.is_empty() {
            return Err(CacheError::Unavailable(name.to_string()));
        }
        let cache: Arc<dyn Cache> = self.open_or_create(name);
        Ok(cache)
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let removed = self.caches.write().remove(name);
        match removed {
            Some(cache) => {
                // Handles still held elsewhere must not keep serving old entries
                cache.clear_all().await;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
