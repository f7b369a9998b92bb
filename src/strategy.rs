//! Caching strategies and the engine that executes them.
//!
//! The engine is handed an in-scope GET request whose TTL has already been
//! resolved. It combines freshness classification, the response store and the
//! injected fetcher according to one of three strategies:
//!
//! | Strategy | Fresh entry | Stale entry | No usable entry | Network failure |
//! |----------|-------------|-------------|-----------------|-----------------|
//! | cache-first | serve | fetch | fetch | serve stale, else error |
//! | network-first | fetch | fetch | fetch | serve fresh/stale, else error |
//! | stale-while-revalidate | serve | serve + background fetch | fetch | error |
//!
//! Retention-expired entries are deleted on sight under every strategy.
//! Only 2xx responses are written to the store.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};
use serde::{Deserialize, Serialize};

use crate::cache::{
    is_expired_for_retention, is_fresh, is_stale, now_millis, Cache, CacheError, CacheKey,
    CachedResponse, HandlerStats,
};
use crate::error::HandlerError;
use crate::network::Fetcher;

/// The closed set of caching strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    #[default]
    NetworkFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::NetworkFirst => "network-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache-first" => Ok(Strategy::CacheFirst),
            "network-first" => Ok(Strategy::NetworkFirst),
            "stale-while-revalidate" => Ok(Strategy::StaleWhileRevalidate),
            other => Err(format!("Unknown caching strategy: '{}'", other)),
        }
    }
}

/// TTL values resolved for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub ttl_seconds: u64,
    pub stale_ttl_seconds: Option<u64>,
    pub max_age_seconds: u64,
}

/// How a stored entry may be used under a `FreshnessPolicy`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    Stale,
    /// Past the retention age, must be deleted
    Expired,
    /// Past the stale window or missing its timestamp
    Unusable,
}

impl FreshnessPolicy {
    /// Retention is checked first so an over-age entry is never served
    pub fn classify(&self, entry: &CachedResponse, now_ms: u64) -> EntryState {
        if is_expired_for_retention(entry, self.max_age_seconds, now_ms) {
            EntryState::Expired
        } else if is_fresh(entry, self.ttl_seconds, now_ms) {
            EntryState::Fresh
        } else if is_stale(entry, self.ttl_seconds, self.stale_ttl_seconds, now_ms) {
            EntryState::Stale
        } else {
            EntryState::Unusable
        }
    }
}

/// Result of reading the store for one key
#[derive(Debug)]
enum Lookup {
    Fresh(CachedResponse),
    Stale(CachedResponse),
    /// An entry existed but was past retention and has been deleted
    Evicted,
    /// No entry, or one that is neither fresh nor stale
    Miss,
}

/// Executes strategies against a store with an injected fetcher
pub struct StrategyEngine<F: Fetcher> {
    fetcher: Arc<F>,
    stats: Arc<HandlerStats>,
}

impl<F: Fetcher> StrategyEngine<F> {
    pub fn new(fetcher: Arc<F>, stats: Arc<HandlerStats>) -> Self {
        Self { fetcher, stats }
    }

    pub async fn execute(
        &self,
        strategy: Strategy,
        request: Request<Bytes>,
        key: CacheKey,
        cache: Arc<dyn Cache>,
        policy: FreshnessPolicy,
    ) -> Result<Response<Bytes>, HandlerError<F::Error>> {
        tracing::debug!(url = %key, strategy = %strategy, ttl = policy.ttl_seconds, "Executing cache strategy");
        match strategy {
            Strategy::CacheFirst => self.cache_first(request, key, cache, policy).await,
            Strategy::NetworkFirst => self.network_first(request, key, cache, policy).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(request, key, cache, policy)
                    .await
            }
        }
    }

    async fn cache_first(
        &self,
        request: Request<Bytes>,
        key: CacheKey,
        cache: Arc<dyn Cache>,
        policy: FreshnessPolicy,
    ) -> Result<Response<Bytes>, HandlerError<F::Error>> {
        let fallback = match self.lookup(cache.as_ref(), &key, &policy).await? {
            Lookup::Fresh(entry) => {
                self.stats.record_hit();
                tracing::debug!(url = %key, "Cache hit");
                return Ok(entry.into_response());
            }
            Lookup::Stale(entry) => Some(entry),
            Lookup::Evicted | Lookup::Miss => None,
        };

        self.stats.record_miss();
        match self.fetcher.fetch(request).await {
            Ok(response) => Ok(store_response(cache.as_ref(), key, response).await?),
            Err(err) => match fallback {
                Some(entry) => {
                    self.stats.record_offline_fallback();
                    tracing::debug!(url = %key, error = %err, "Network failed, serving stale entry");
                    Ok(entry.into_response())
                }
                None => Err(HandlerError::Network(err)),
            },
        }
    }

    async fn network_first(
        &self,
        request: Request<Bytes>,
        key: CacheKey,
        cache: Arc<dyn Cache>,
        policy: FreshnessPolicy,
    ) -> Result<Response<Bytes>, HandlerError<F::Error>> {
        let err = match self.fetcher.fetch(request).await {
            Ok(response) => return Ok(store_response(cache.as_ref(), key, response).await?),
            Err(err) => err,
        };

        match self.lookup(cache.as_ref(), &key, &policy).await? {
            Lookup::Fresh(entry) | Lookup::Stale(entry) => {
                self.stats.record_offline_fallback();
                tracing::debug!(url = %key, error = %err, "Network failed, serving cached entry");
                Ok(entry.into_response())
            }
            Lookup::Evicted | Lookup::Miss => {
                self.stats.record_miss();
                Err(HandlerError::Network(err))
            }
        }
    }

    async fn stale_while_revalidate(
        &self,
        request: Request<Bytes>,
        key: CacheKey,
        cache: Arc<dyn Cache>,
        policy: FreshnessPolicy,
    ) -> Result<Response<Bytes>, HandlerError<F::Error>> {
        match self.lookup(cache.as_ref(), &key, &policy).await? {
            Lookup::Fresh(entry) => {
                self.stats.record_hit();
                tracing::debug!(url = %key, "Cache hit");
                Ok(entry.into_response())
            }
            Lookup::Stale(entry) => {
                self.stats.record_stale_served();
                tracing::debug!(url = %key, "Serving stale entry, revalidating in background");
                self.spawn_revalidation(request, key, cache);
                Ok(entry.into_response())
            }
            Lookup::Evicted | Lookup::Miss => {
                self.stats.record_miss();
                let response = self
                    .fetcher
                    .fetch(request)
                    .await
                    .map_err(HandlerError::Network)?;
                Ok(store_response(cache.as_ref(), key, response).await?)
            }
        }
    }

    /// Read and classify the entry for `key`, deleting it if past retention
    async fn lookup(
        &self,
        cache: &dyn Cache,
        key: &CacheKey,
        policy: &FreshnessPolicy,
    ) -> Result<Lookup, CacheError> {
        let Some(entry) = cache.get(key).await? else {
            return Ok(Lookup::Miss);
        };
        let now = now_millis();
        Ok(match policy.classify(&entry, now) {
            EntryState::Fresh => Lookup::Fresh(entry),
            EntryState::Stale => Lookup::Stale(entry),
            EntryState::Unusable => Lookup::Miss,
            EntryState::Expired => {
                cache.delete(key).await?;
                self.stats.record_evictions(1);
                tracing::debug!(
                    url = %key,
                    max_age = policy.max_age_seconds,
                    "Deleted entry past retention age"
                );
                Lookup::Evicted
            }
        })
    }

    /// Refresh `key` from the network without holding up the caller.
    /// Failures are logged and dropped.
    fn spawn_revalidation(&self, request: Request<Bytes>, key: CacheKey, cache: Arc<dyn Cache>) {
        let fetcher = Arc::clone(&self.fetcher);
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            match fetcher.fetch(request).await {
                Ok(response) => {
                    let (_, copy) = CachedResponse::capture(response);
                    if !copy.is_success() {
                        tracing::debug!(url = %key, status = copy.status.as_u16(), "Revalidation returned non-success, keeping stale entry");
                        return;
                    }
                    match cache.put(key.clone(), copy.with_timestamp(now_millis())).await {
                        Ok(()) => {
                            stats.record_revalidation();
                            tracing::debug!(url = %key, "Background revalidation stored fresh entry");
                        }
                        Err(e) => {
                            tracing::warn!(url = %key, error = %e, "Failed to store revalidated entry")
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %key, error = %e, "Background revalidation failed");
                }
            }
        });
    }
}

/// Write a 2xx response to the store with a fresh timestamp and hand the live
/// response back unchanged
async fn store_response(
    cache: &dyn Cache,
    key: CacheKey,
    response: Response<Bytes>,
) -> Result<Response<Bytes>, CacheError> {
    let (live, copy) = CachedResponse::capture(response);
    if copy.is_success() {
        cache.put(key, copy.with_timestamp(now_millis())).await?;
    }
    Ok(live)
}
