// fetch-cache: caching request interceptor library

pub mod cache;
pub mod classify;
pub mod config;
pub mod constants;
pub mod directives;
pub mod error;
pub mod eviction;
pub mod handler;
pub mod invalidation;
pub mod logging;
pub mod network;
pub mod strategy;

pub use cache::{Cache, CacheError, CacheKey, CacheStorage, CachedResponse, MemoryCacheStorage};
pub use config::{Config, ConfigError};
pub use directives::CacheDirectives;
pub use error::HandlerError;
pub use handler::{CacheHandler, HandleOutcome};
pub use network::{fetch_fn, FetchError, Fetcher, ReqwestFetcher};
pub use strategy::Strategy;
