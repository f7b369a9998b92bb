// Error types module

use thiserror::Error;

use crate::cache::CacheError;

/// Request-time failure of the cache handler.
///
/// `E` is the fetcher's own error type. A network failure that no strategy
/// could recover from is carried as-is in `Network`, so callers see exactly
/// what the transport raised.
#[derive(Debug, Error)]
pub enum HandlerError<E>
where
    E: std::error::Error + 'static,
{
    /// The network call failed and no cached entry was usable
    #[error(transparent)]
    Network(E),

    /// The response store failed on the request path
    #[error("Cache storage error: {0}")]
    Storage(#[from] CacheError),
}

impl<E> HandlerError<E>
where
    E: std::error::Error + 'static,
{
    pub fn is_network(&self) -> bool {
        matches!(self, HandlerError::Network(_))
    }

    /// Borrow the original network error, if that is what failed
    pub fn network_error(&self) -> Option<&E> {
        match self {
            HandlerError::Network(err) => Some(err),
            HandlerError::Storage(_) => None,
        }
    }

    /// Recover the original network error, if that is what failed
    pub fn into_network_error(self) -> Option<E> {
        match self {
            HandlerError::Network(err) => Some(err),
            HandlerError::Storage(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("dns lookup failed for {0}")]
    struct DnsError(String);

    #[test]
    fn test_network_variant_is_transparent() {
        let err: HandlerError<DnsError> = HandlerError::Network(DnsError("api".to_string()));
        assert_eq!(err.to_string(), "dns lookup failed for api");
        assert!(err.is_network());
    }

    #[test]
    fn test_into_network_error_returns_original_value() {
        let err: HandlerError<DnsError> = HandlerError::Network(DnsError("api".to_string()));
        assert_eq!(err.into_network_error(), Some(DnsError("api".to_string())));
    }

    #[test]
    fn test_storage_variant_converts_from_cache_error() {
        let err: HandlerError<DnsError> = CacheError::StoreFailed("disk".to_string()).into();
        assert!(!err.is_network());
        assert!(err.network_error().is_none());
        assert!(err.to_string().contains("disk"));
    }
}
