//! Coarse request classification by path prefix.

use std::borrow::Cow;

/// Admin back-office and auth pages
pub const ADMIN_PREFIX: &str = "/admin";
pub const AUTH_PREFIX: &str = "/auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Session-gated: admin back-office and auth pages
    AdminOrAuth,
    /// Everything else: locale negotiation applies
    LocalizedPublic,
}

/// Classify a request path. Total: anything unmatched is `LocalizedPublic`.
pub fn classify(path: &str) -> RouteClass {
    let normalized = normalize_path(path);
    if normalized.starts_with(ADMIN_PREFIX) || normalized.starts_with(AUTH_PREFIX) {
        RouteClass::AdminOrAuth
    } else {
        RouteClass::LocalizedPublic
    }
}

/// Percent-decode, ensure a leading slash, collapse repeated slashes and drop a
/// trailing slash (except for the root).
pub fn normalize_path(path: &str) -> String {
    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));

    let mut normalized = String::with_capacity(decoded.len() + 1);
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}
