//! Request handler: the entry point deciding, per request, between cache
//! clearing, invalidation, the strategy engine, or leaving the request alone.
//!
//! # Decision order
//!
//! 1. Clear directive: drop the cache, pass the request to the network.
//! 2. Invalidation directives, or a mutating request with inference on:
//!    delete targets, pass the request to the network.
//! 3. Not a GET: not handled.
//! 4. Cross-origin: not handled.
//! 5. Periodic eviction bookkeeping.
//! 6. TTL resolves to disabled: not handled.
//! 7. Out of scope without an explicit TTL directive: not handled.
//! 8. Run the resolved strategy.

use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, Uri};
use url::Url;

use crate::cache::{CacheError, CacheKey, CacheStorage, HandlerStats, StatsSnapshot};
use crate::classify::{self, MethodCategory};
use crate::config::{Config, ConfigError};
use crate::directives::CacheDirectives;
use crate::error::HandlerError;
use crate::eviction::{self, SweepCounter};
use crate::invalidation;
use crate::network::{Fetcher, ReqwestFetcher};
use crate::strategy::{FreshnessPolicy, StrategyEngine};

/// What the handler did with a request
#[derive(Debug)]
pub enum HandleOutcome {
    /// A response the caller should use
    Response(Response<Bytes>),
    /// The handler declined; the caller should apply its own default handling
    NotHandled,
}

impl HandleOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, HandleOutcome::Response(_))
    }

    pub fn into_response(self) -> Option<Response<Bytes>> {
        match self {
            HandleOutcome::Response(response) => Some(response),
            HandleOutcome::NotHandled => None,
        }
    }
}

/// Caching request interceptor.
///
/// One instance owns its configuration, statistics and sweep counter, so
/// several differently configured handlers can run side by side.
pub struct CacheHandler<F: Fetcher> {
    config: Config,
    origin: Url,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<F>,
    engine: StrategyEngine<F>,
    stats: Arc<HandlerStats>,
    sweep_counter: SweepCounter,
}

impl CacheHandler<ReqwestFetcher> {
    /// Handler using the default reqwest-backed network function
    pub fn with_default_network(
        config: Config,
        storage: Arc<dyn CacheStorage>,
    ) -> Result<Self, ConfigError> {
        Self::new(config, storage, ReqwestFetcher::new())
    }
}

impl<F: Fetcher> CacheHandler<F> {
    /// Validate `config` and build a handler. Fails closed on invalid configuration.
    pub fn new(
        config: Config,
        storage: Arc<dyn CacheStorage>,
        fetcher: F,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let origin = config.origin_url()?;

        let fetcher = Arc::new(fetcher);
        let stats = Arc::new(HandlerStats::new());
        let engine = StrategyEngine::new(Arc::clone(&fetcher), Arc::clone(&stats));

        tracing::info!(
            cache = %config.cache_name,
            origin = %origin,
            scope = ?config.scope,
            strategy = %config.default_strategy,
            default_ttl = config.default_ttl_seconds,
            "Cache handler initialized"
        );

        Ok(Self {
            config,
            origin,
            storage,
            fetcher,
            engine,
            stats,
            sweep_counter: SweepCounter::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Drop the whole cache. Returns true if it existed
    pub async fn clear(&self) -> Result<bool, CacheError> {
        let existed = self.storage.delete(&self.config.cache_name).await?;
        self.stats.record_clear();
        Ok(existed)
    }

    /// Run a full eviction sweep now and wait for it
    pub async fn sweep_now(&self) -> usize {
        let deleted = eviction::sweep_expired(
            self.storage.as_ref(),
            &self.config.cache_name,
            self.config.max_age_seconds,
        )
        .await;
        self.stats.record_evictions(deleted as u64);
        deleted
    }

    pub async fn handle(
        &self,
        request: Request<Bytes>,
    ) -> Result<HandleOutcome, HandlerError<F::Error>> {
        let directives = CacheDirectives::from_headers(request.headers());
        let resolved = classify::request_url(request.uri(), &self.origin);

        if directives.clear {
            let existed = self.clear().await?;
            tracing::info!(cache = %self.config.cache_name, existed, "Cache cleared by request directive");
            let request = match &resolved {
                Ok(url) => with_absolute_uri(request, url).unwrap_or_else(|original| original),
                Err(_) => request,
            };
            return self.pass_through(request).await;
        }

        let url = match resolved {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(uri = %request.uri(), error = %e, "Request URI not resolvable, not handled");
                return Ok(HandleOutcome::NotHandled);
            }
        };
        let Ok(request) = with_absolute_uri(request, &url) else {
            return Ok(HandleOutcome::NotHandled);
        };
        let category = classify::method_category(request.method());

        if !directives.invalidate.is_empty()
            || (self.config.infer_invalidation && category == MethodCategory::Mutating)
        {
            let targets =
                invalidation::plan(&directives, category, &url, self.config.infer_invalidation);
            if !targets.is_empty() {
                let cache = self.storage.open(&self.config.cache_name).await?;
                let applied = invalidation::apply(cache.as_ref(), &targets).await?;
                self.stats.record_invalidations(targets.len() as u64);
                tracing::debug!(
                    url = %url,
                    targets = ?targets.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
                    applied,
                    "Invalidated cache targets"
                );
            }
            return self.pass_through(request).await;
        }

        if category != MethodCategory::Read {
            return Ok(HandleOutcome::NotHandled);
        }

        if !classify::is_same_origin(&url, &self.origin) {
            tracing::debug!(url = %url, "Cross-origin read, not handled");
            return Ok(HandleOutcome::NotHandled);
        }

        if self.sweep_counter.tick() {
            self.spawn_sweep();
        }

        let Some(ttl_seconds) = directives.resolve_ttl(self.config.default_ttl_seconds) else {
            tracing::debug!(url = %url, "Caching disabled for request, not handled");
            return Ok(HandleOutcome::NotHandled);
        };

        if !directives.has_explicit_ttl()
            && !classify::in_scope(
                url.path(),
                &self.config.scope,
                self.config.default_ttl_seconds,
            )
        {
            return Ok(HandleOutcome::NotHandled);
        }

        let policy = FreshnessPolicy {
            ttl_seconds,
            stale_ttl_seconds: directives.resolve_stale_ttl(self.config.default_stale_ttl_seconds),
            max_age_seconds: self.config.max_age_seconds,
        };
        let strategy = directives.resolve_strategy(self.config.default_strategy);
        let cache = self.storage.open(&self.config.cache_name).await?;

        let response = self
            .engine
            .execute(strategy, request, CacheKey::from_url(url), cache, policy)
            .await?;
        Ok(HandleOutcome::Response(response))
    }

    /// Exactly one network call, result returned as-is and never cached
    async fn pass_through(
        &self,
        request: Request<Bytes>,
    ) -> Result<HandleOutcome, HandlerError<F::Error>> {
        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(HandlerError::Network)?;
        Ok(HandleOutcome::Response(response))
    }

    fn spawn_sweep(&self) {
        let storage = Arc::clone(&self.storage);
        let stats = Arc::clone(&self.stats);
        let cache_name = self.config.cache_name.clone();
        let max_age_seconds = self.config.max_age_seconds;
        tokio::spawn(async move {
            let deleted = eviction::sweep_expired(storage.as_ref(), &cache_name, max_age_seconds).await;
            stats.record_evictions(deleted as u64);
        });
    }
}

/// Rewrite an origin-form request URI into absolute form so the fetcher
/// always sees a full URL. Hands the request back untouched on failure.
fn with_absolute_uri(
    mut request: Request<Bytes>,
    url: &Url,
) -> Result<Request<Bytes>, Request<Bytes>> {
    if request.uri().scheme().is_some() {
        return Ok(request);
    }
    match url.as_str().parse::<Uri>() {
        Ok(uri) => {
            *request.uri_mut() = uri;
            Ok(request)
        }
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Resolved URL is not a valid URI");
            Err(request)
        }
    }
}
