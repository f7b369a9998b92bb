//! Request classification: method category, origin match and scope match.

use http::{Method, Uri};
use url::Url;

/// What the handler may do with a request based on its method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodCategory {
    /// GET, eligible for caching
    Read,
    /// POST, PUT, PATCH, DELETE, eligible for invalidation
    Mutating,
    /// Everything else (HEAD, OPTIONS, ...), left to the caller
    Unhandled,
}

pub fn method_category(method: &Method) -> MethodCategory {
    match *method {
        Method::GET => MethodCategory::Read,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE => MethodCategory::Mutating,
        _ => MethodCategory::Unhandled,
    }
}

/// Absolute URL of a request.
///
/// Origin-form URIs (`/api/users?x=1`) are resolved against `origin`.
pub fn request_url(uri: &Uri, origin: &Url) -> Result<Url, url::ParseError> {
    if uri.scheme().is_some() {
        Url::parse(&uri.to_string())
    } else {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        origin.join(path_and_query)
    }
}

pub fn is_same_origin(url: &Url, origin: &Url) -> bool {
    url.origin() == origin.origin()
}

/// Case-sensitive prefix match of `path` against the configured scope.
///
/// An empty scope admits every path, but only while a positive default TTL
/// is configured.
pub fn in_scope(path: &str, scope: &[String], default_ttl_seconds: u64) -> bool {
    if scope.is_empty() {
        return default_ttl_seconds > 0;
    }
    scope.iter().any(|prefix| path.starts_with(prefix.as_str()))
}
