//! Per-request cache directives read from request headers.
//!
//! Directives are derived fresh for every request and never stored.

use http::HeaderMap;

use crate::constants::{
    CLEAR_HEADER, INVALIDATE_HEADER, STALE_TTL_HEADER, STRATEGY_HEADER, TTL_HEADER,
};
use crate::strategy::Strategy;

/// Directives carried by one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDirectives {
    /// Valid strategy override, if any
    pub strategy: Option<Strategy>,
    /// Non-negative integer TTL override, `Some(0)` is an opt-out
    pub ttl_seconds: Option<u64>,
    /// Non-negative integer stale TTL override, `Some(0)` disables stale fallback
    pub stale_ttl_seconds: Option<u64>,
    /// Invalidation targets in header order, as written by the client
    pub invalidate: Vec<String>,
    /// Clear header present
    pub clear: bool,
}

impl CacheDirectives {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let strategy = header_str(headers, STRATEGY_HEADER).and_then(|value| {
            match value.parse::<Strategy>() {
                Ok(strategy) => Some(strategy),
                Err(e) => {
                    tracing::debug!(value, error = %e, "Ignoring invalid strategy directive");
                    None
                }
            }
        });

        let invalidate = headers
            .get_all(INVALIDATE_HEADER)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            strategy,
            ttl_seconds: header_str(headers, TTL_HEADER).and_then(parse_seconds),
            stale_ttl_seconds: header_str(headers, STALE_TTL_HEADER).and_then(parse_seconds),
            invalidate,
            clear: headers.contains_key(CLEAR_HEADER),
        }
    }

    pub fn has_explicit_ttl(&self) -> bool {
        self.ttl_seconds.is_some()
    }

    /// Effective TTL, or None when caching is disabled for this request
    pub fn resolve_ttl(&self, default_ttl_seconds: u64) -> Option<u64> {
        let ttl = self.ttl_seconds.unwrap_or(default_ttl_seconds);
        (ttl > 0).then_some(ttl)
    }

    /// Effective stale TTL, or None when stale fallback is off
    pub fn resolve_stale_ttl(&self, default_stale_ttl_seconds: Option<u64>) -> Option<u64> {
        self.stale_ttl_seconds
            .or(default_stale_ttl_seconds)
            .filter(|s| *s > 0)
    }

    pub fn resolve_strategy(&self, default_strategy: Strategy) -> Strategy {
        self.strategy.unwrap_or(default_strategy)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

/// Integer seconds; negative or non-numeric values count as absent
fn parse_seconds(value: &str) -> Option<u64> {
    match value.parse::<i64>() {
        Ok(n) if n >= 0 => Some(n as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use rstest::rstest;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_no_headers_yields_empty_directives() {
        let d = CacheDirectives::from_headers(&HeaderMap::new());
        assert_eq!(d, CacheDirectives::default());
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let mut map = HeaderMap::new();
        map.insert(
            http::HeaderName::from_bytes(b"X-SW-Cache-TTL-Seconds").unwrap(),
            HeaderValue::from_static("60"),
        );
        assert_eq!(CacheDirectives::from_headers(&map).ttl_seconds, Some(60));
    }

    #[rstest]
    #[case("120", Some(120))]
    #[case(" 15 ", Some(15))]
    #[case("0", Some(0))]
    #[case("-1", None)]
    #[case("ten", None)]
    #[case("1.5", None)]
    #[case("", None)]
    fn test_ttl_parsing(#[case] raw: &'static str, #[case] expected: Option<u64>) {
        let d = CacheDirectives::from_headers(&headers(&[(TTL_HEADER, raw)]));
        assert_eq!(d.ttl_seconds, expected);
        let d = CacheDirectives::from_headers(&headers(&[(STALE_TTL_HEADER, raw)]));
        assert_eq!(d.stale_ttl_seconds, expected);
    }

    #[test]
    fn test_invalid_strategy_is_ignored() {
        let d = CacheDirectives::from_headers(&headers(&[(STRATEGY_HEADER, "cache-only")]));
        assert_eq!(d.strategy, None);
        assert_eq!(d.resolve_strategy(Strategy::NetworkFirst), Strategy::NetworkFirst);

        let d = CacheDirectives::from_headers(&headers(&[(STRATEGY_HEADER, "cache-first")]));
        assert_eq!(d.resolve_strategy(Strategy::NetworkFirst), Strategy::CacheFirst);
    }

    #[test]
    fn test_repeated_invalidate_headers_are_collected_in_order() {
        let d = CacheDirectives::from_headers(&headers(&[
            (INVALIDATE_HEADER, "/api/teams"),
            (INVALIDATE_HEADER, "/api/orgs, /api/users"),
            (INVALIDATE_HEADER, " , "),
        ]));
        assert_eq!(d.invalidate, vec!["/api/teams", "/api/orgs", "/api/users"]);
    }

    #[test]
    fn test_clear_flag_set_by_presence_alone() {
        assert!(CacheDirectives::from_headers(&headers(&[(CLEAR_HEADER, "")])).clear);
        assert!(CacheDirectives::from_headers(&headers(&[(CLEAR_HEADER, "false")])).clear);
    }

    #[test]
    fn test_resolve_ttl() {
        let none = CacheDirectives::default();
        assert_eq!(none.resolve_ttl(300), Some(300));
        assert_eq!(none.resolve_ttl(0), None);

        let explicit = CacheDirectives {
            ttl_seconds: Some(30),
            ..Default::default()
        };
        assert_eq!(explicit.resolve_ttl(0), Some(30));
        assert!(explicit.has_explicit_ttl());

        let opt_out = CacheDirectives {
            ttl_seconds: Some(0),
            ..Default::default()
        };
        assert_eq!(opt_out.resolve_ttl(300), None);
    }

    #[test]
    fn test_resolve_stale_ttl() {
        let none = CacheDirectives::default();
        assert_eq!(none.resolve_stale_ttl(Some(600)), Some(600));
        assert_eq!(none.resolve_stale_ttl(None), None);

        let explicit = CacheDirectives {
            stale_ttl_seconds: Some(120),
            ..Default::default()
        };
        assert_eq!(explicit.resolve_stale_ttl(None), Some(120));

        let disabled = CacheDirectives {
            stale_ttl_seconds: Some(0),
            ..Default::default()
        };
        assert_eq!(disabled.resolve_stale_ttl(Some(600)), None);
    }
}
