//! Invalidation planning for mutating requests.
//!
//! Explicit directives, when present, are the entire target set. Otherwise,
//! with inference enabled, a mutating request invalidates its own URL and
//! its parent collection (`/api/users/123` -> `/api/users`). Targets are
//! applied by path, so every query variant of a target is removed.

use url::Url;

use crate::cache::{Cache, CacheError, CacheKey};
use crate::classify::MethodCategory;
use crate::directives::CacheDirectives;

/// Targets inferred from a URL's shape: the URL itself and its parent.
///
/// Root and single-segment paths have no parent target. Empty segments are
/// skipped, so a trailing slash does not count as a segment
/// (`/api/users/` has parent `/api`).
pub fn infer_targets(url: &Url) -> Vec<CacheKey> {
    let mut targets = vec![CacheKey::from_url(url.clone())];

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() >= 2 {
        let mut parent = url.clone();
        parent.set_path(&format!("/{}", segments[..segments.len() - 1].join("/")));
        parent.set_query(None);
        targets.push(CacheKey::from_url(parent));
    }

    targets
}

/// Resolve a directive value against the mutating request's origin.
///
/// Absolute URLs are kept. Paths, with or without a leading slash, resolve
/// from the origin root, never from the request's own path.
pub fn resolve_target(value: &str, request_url: &Url) -> Option<CacheKey> {
    let resolved = Url::parse(&request_url.origin().ascii_serialization())
        .and_then(|origin| origin.join(value));
    match resolved {
        Ok(url) => Some(CacheKey::from_url(url)),
        Err(e) => {
            tracing::warn!(target_value = value, error = %e, "Ignoring unresolvable invalidation target");
            None
        }
    }
}

/// Compute the invalidation target set for a request
pub fn plan(
    directives: &CacheDirectives,
    category: MethodCategory,
    request_url: &Url,
    infer: bool,
) -> Vec<CacheKey> {
    let candidates = if !directives.invalidate.is_empty() {
        directives
            .invalidate
            .iter()
            .filter_map(|value| resolve_target(value, request_url))
            .collect()
    } else if infer && category == MethodCategory::Mutating {
        infer_targets(request_url)
    } else {
        Vec::new()
    };

    let mut targets: Vec<CacheKey> = Vec::with_capacity(candidates.len());
    for target in candidates {
        if !targets.iter().any(|t| t.same_path(&target)) {
            targets.push(target);
        }
    }
    targets
}

/// Delete every entry matching each target's path.
/// Returns the number of targets that removed at least one entry
pub async fn apply(cache: &dyn Cache, targets: &[CacheKey]) -> Result<usize, CacheError> {
    let mut applied = 0;
    for target in targets {
        if cache.delete_ignoring_query(target).await? {
            applied += 1;
        }
        tracing::debug!(target_url = %target, "Invalidated cache path");
    }
    Ok(applied)
}
