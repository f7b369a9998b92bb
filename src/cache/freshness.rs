//! Freshness classification of cached entries.
//!
//! All predicates take the current instant explicitly and operate on the
//! timestamp embedded in the entry. A missing or unparseable timestamp makes
//! every predicate false, so such an entry behaves as a cache miss.

use std::time::{SystemTime, UNIX_EPOCH};

use super::entry::CachedResponse;

/// Current wall-clock time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Age of the entry in milliseconds.
///
/// Entries stamped in the future (clock skew) have age zero.
pub fn age_ms(entry: &CachedResponse, now_ms: u64) -> Option<u64> {
    entry.timestamp().map(|ts| now_ms.saturating_sub(ts))
}

/// Within the primary TTL. `age == ttl` is not fresh.
pub fn is_fresh(entry: &CachedResponse, ttl_seconds: u64, now_ms: u64) -> bool {
    match age_ms(entry, now_ms) {
        Some(age) => age < ttl_seconds.saturating_mul(1000),
        None => false,
    }
}

/// Past the primary TTL but still inside the stale TTL window.
///
/// Always false when there is no stale TTL.
pub fn is_stale(
    entry: &CachedResponse,
    ttl_seconds: u64,
    stale_ttl_seconds: Option<u64>,
    now_ms: u64,
) -> bool {
    let Some(stale_ttl) = stale_ttl_seconds else {
        return false;
    };
    match age_ms(entry, now_ms) {
        Some(age) => {
            age >= ttl_seconds.saturating_mul(1000) && age < stale_ttl.saturating_mul(1000)
        }
        None => false,
    }
}

/// Past the maximum retention age. `age == max_age` counts as expired.
pub fn is_expired_for_retention(entry: &CachedResponse, max_age_seconds: u64, now_ms: u64) -> bool {
    match age_ms(entry, now_ms) {
        Some(age) => age >= max_age_seconds.saturating_mul(1000),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use rstest::rstest;

    const NOW: u64 = 1_700_000_000_000;

    fn entry_aged(age_ms: u64) -> CachedResponse {
        CachedResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::new())
            .with_timestamp(NOW - age_ms)
    }

    fn untimed_entry() -> CachedResponse {
        CachedResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::new())
    }

    #[test]
    fn test_age_is_now_minus_timestamp() {
        assert_eq!(age_ms(&entry_aged(1500), NOW), Some(1500));
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let entry = untimed_entry().with_timestamp(NOW + 5000);
        assert_eq!(age_ms(&entry, NOW), Some(0));
    }

    #[rstest]
    #[case(0, 60, true)]
    #[case(59_999, 60, true)]
    #[case(60_000, 60, false)]
    #[case(60_001, 60, false)]
    #[case(0, 0, false)]
    fn test_is_fresh_uses_strict_less_than(
        #[case] age: u64,
        #[case] ttl: u64,
        #[case] expected: bool,
    ) {
        assert_eq!(is_fresh(&entry_aged(age), ttl, NOW), expected);
    }

    #[rstest]
    #[case(59_999, 60, Some(120), false)]
    #[case(60_000, 60, Some(120), true)]
    #[case(119_999, 60, Some(120), true)]
    #[case(120_000, 60, Some(120), false)]
    #[case(90_000, 60, None, false)]
    fn test_is_stale_window(
        #[case] age: u64,
        #[case] ttl: u64,
        #[case] stale_ttl: Option<u64>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_stale(&entry_aged(age), ttl, stale_ttl, NOW), expected);
    }

    #[rstest]
    #[case(3_599_999, 3600, false)]
    #[case(3_600_000, 3600, true)]
    #[case(7_200_000, 3600, true)]
    fn test_retention_boundary_is_inclusive(
        #[case] age: u64,
        #[case] max_age: u64,
        #[case] expected: bool,
    ) {
        assert_eq!(is_expired_for_retention(&entry_aged(age), max_age, NOW), expected);
    }

    #[test]
    fn test_missing_timestamp_fails_every_predicate() {
        let entry = untimed_entry();
        assert_eq!(age_ms(&entry, NOW), None);
        assert!(!is_fresh(&entry, 3600, NOW));
        assert!(!is_stale(&entry, 0, Some(3600), NOW));
        assert!(!is_expired_for_retention(&entry, 0, NOW));
    }

    #[test]
    fn test_fresh_and_stale_are_disjoint() {
        for age in [0, 30_000, 59_999, 60_000, 100_000, 200_000] {
            let entry = entry_aged(age);
            assert!(!(is_fresh(&entry, 60, NOW) && is_stale(&entry, 60, Some(120), NOW)));
        }
    }

    #[test]
    fn test_now_millis_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
