//! Cache trait definitions
//!
//! The response store is an external collaborator. These traits are the whole
//! surface the handler uses: open or drop a named cache, and look up, write,
//! delete and enumerate entries within it.

use std::sync::Arc;

use async_trait::async_trait;

use super::entry::{CacheKey, CachedResponse};
use super::error::CacheError;

/// A collection of named caches
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the cache with the given name, creating it if it does not exist
    async fn open(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError>;

    /// Drop the named cache and everything in it.
    /// Returns true if the cache existed
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;
}

/// A single named response cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// Exact-key lookup
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError>;

    /// All entries whose key has the same origin and path as `key`, any query
    async fn get_ignoring_query(&self, key: &CacheKey) -> Result<Vec<CachedResponse>, CacheError>;

    /// Insert or replace the entry for `key`
    async fn put(&self, key: CacheKey, entry: CachedResponse) -> Result<(), CacheError>;

    /// Delete the exact key.
    /// Returns true if an entry was deleted
    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Delete every entry sharing `key`'s origin and path, any query.
    /// Returns true if at least one entry was deleted
    async fn delete_ignoring_query(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Enumerate all keys currently stored
    async fn keys(&self) -> Result<Vec<CacheKey>, CacheError>;
}
