// Constants module - centralized header names and default values
//
// Header names are matched case-insensitively (http::HeaderName is always
// lowercase), so they are declared lowercase here.

// =============================================================================
// Request directive headers
// =============================================================================

/// Per-request strategy override (`cache-first`, `network-first`, `stale-while-revalidate`)
pub const STRATEGY_HEADER: &str = "x-sw-cache-strategy";

/// Per-request TTL override in seconds; `0` opts the request out of caching
pub const TTL_HEADER: &str = "x-sw-cache-ttl-seconds";

/// Per-request stale TTL override in seconds; `0` disables stale fallback
pub const STALE_TTL_HEADER: &str = "x-sw-cache-stale-ttl-seconds";

/// Invalidation target, may be repeated or comma-separated
pub const INVALIDATE_HEADER: &str = "x-sw-cache-invalidate";

/// Presence of this header (any value) clears the whole cache
pub const CLEAR_HEADER: &str = "x-sw-cache-clear";

// =============================================================================
// Response metadata
// =============================================================================

/// Creation instant (milliseconds since the Unix epoch) embedded in cached responses
pub const TIMESTAMP_HEADER: &str = "x-sw-cache-timestamp";

// =============================================================================
// Configuration defaults
// =============================================================================

/// Default cache identifier
pub const DEFAULT_CACHE_NAME: &str = "api-cache-v1";

/// Default TTL in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Default maximum retention age in seconds (7 days)
pub const DEFAULT_MAX_AGE_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Default log level when RUST_LOG is not set
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Eviction
// =============================================================================

/// Number of GET requests between periodic sweeps
pub const SWEEP_INTERVAL: u64 = 100;
