//! Cache error types
//!
//! This module defines error types for response store operations.

/// Cache error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The named cache could not be opened
    Unavailable(String),
    /// A write or delete against the store failed
    StoreFailed(String),
    /// The key is not a valid absolute URL
    InvalidKey(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Unavailable(name) => write!(f, "Cache '{}' is unavailable", name),
            CacheError::StoreFailed(msg) => write!(f, "Cache store operation failed: {}", msg),
            CacheError::InvalidKey(key) => write!(f, "Invalid cache key: {}", key),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<url::ParseError> for CacheError {
    fn from(err: url::ParseError) -> Self {
        CacheError::InvalidKey(err.to_string())
    }
}
