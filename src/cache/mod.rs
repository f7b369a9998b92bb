//! Response cache module
//!
//! This module provides the store contract and everything that reasons about
//! a single stored entry:
//! - `traits`: `CacheStorage` / `Cache` store adapter
//! - `entry`: `CacheKey` and `CachedResponse`
//! - `freshness`: fresh / stale / retention-expired classification
//! - `memory`: moka-backed default store
//! - `stats`: per-handler counters

pub mod entry;
pub mod error;
pub mod freshness;
pub mod memory;
pub mod stats;
pub mod traits;

pub use entry::{CacheKey, CachedResponse};
pub use error::CacheError;
pub use freshness::{age_ms, is_expired_for_retention, is_fresh, is_stale, now_millis};
pub use memory::{MemoryCache, MemoryCacheStorage};
pub use stats::{HandlerStats, StatsSnapshot};
pub use traits::{Cache, CacheStorage};
