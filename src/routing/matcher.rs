//! Which requests the edge middleware sees at all.
//!
//! Matches the root, locale-prefixed paths, `/admin/...`, `/auth/...`, and any
//! other path that is not framework/API plumbing and has no file extension.
//! Everything else (API routes, static files) goes straight to the router.

use crate::locale::LocaleSettings;

/// First path segments excluded from the generic catch-all
const EXCLUDED_PREFIXES: [&str; 5] = ["_next", "_vercel", "api", "auth", "admin"];

#[derive(Debug, Clone)]
pub struct RouteMatcher {
    locales: Vec<String>,
}

impl RouteMatcher {
    pub fn new(locales: &LocaleSettings) -> Self {
        Self {
            locales: locales.locales.clone(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        if path == "/" {
            return true;
        }
        if self
            .locales
            .iter()
            .any(|locale| segment_prefix(path, locale))
        {
            return true;
        }
        if segment_prefix(path, "admin") || segment_prefix(path, "auth") {
            return true;
        }
        catch_all(path)
    }
}

/// `/{name}` or `/{name}/...`
fn segment_prefix(path: &str, name: &str) -> bool {
    path.strip_prefix('/')
        .and_then(|rest| rest.strip_prefix(name))
        .is_some_and(|tail| tail.is_empty() || tail.starts_with('/'))
}

/// Literal prefix exclusion: `/apiary` is excluded just like `/api/...`.
fn catch_all(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    if EXCLUDED_PREFIXES.iter().any(|p| rest.starts_with(p)) {
        return false;
    }
    !rest.contains('.')
}
