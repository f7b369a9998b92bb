//! Cache key and entry types
//!
//! This module defines the core cache entry structures:
//! - `CacheKey`: Full request URL (query string included, fragment dropped)
//! - `CachedResponse`: Stored response status, headers and body, with the
//!   capture instant embedded as a response header
//!
//! No TTL is ever stored with an entry. Freshness is decided at read time from
//! the embedded timestamp and whatever TTL the reading request carries.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Response, StatusCode};
use url::Url;

use super::error::CacheError;
use crate::constants::TIMESTAMP_HEADER;

/// Cache key for identifying cached responses
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheKey(Url);

impl CacheKey {
    /// Build a key from a parsed URL, dropping any fragment
    pub fn from_url(mut url: Url) -> Self {
        url.set_fragment(None);
        Self(url)
    }

    /// Parse an absolute URL string into a key
    pub fn parse(s: &str) -> Result<Self, CacheError> {
        Ok(Self::from_url(Url::parse(s)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Returns true if both keys name the same origin and path, ignoring query
    pub fn same_path(&self, other: &CacheKey) -> bool {
        self.0.origin() == other.0.origin() && self.0.path() == other.0.path()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// A response as held by the store.
///
/// Entries are whole-value replaced, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code returned by the network
    pub status: StatusCode,
    /// Response headers, including the timestamp header once cached
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Copy a live network response without consuming it.
    ///
    /// Returns the untouched response alongside the copy.
    pub fn capture(response: Response<Bytes>) -> (Response<Bytes>, Self) {
        let (parts, body) = response.into_parts();
        let copy = Self::new(parts.status, parts.headers.clone(), body.clone());
        (Response::from_parts(parts, body), copy)
    }

    /// Stamp the entry with its capture instant (milliseconds since epoch)
    pub fn with_timestamp(mut self, now_ms: u64) -> Self {
        self.headers
            .insert(TIMESTAMP_HEADER, HeaderValue::from(now_ms));
        self
    }

    /// The embedded capture instant, or None if missing or unparseable
    pub fn timestamp(&self) -> Option<u64> {
        self.headers
            .get(TIMESTAMP_HEADER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Rebuild an `http::Response` for the caller
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
