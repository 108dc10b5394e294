//! Session gate for admin and auth paths.

use axum_extra::extract::CookieJar;

use super::session::{Session, SessionProvider};
use crate::cookies::CookieMutations;
use crate::routing::classifier::{classify, normalize_path, RouteClass, ADMIN_PREFIX};

pub const SIGN_IN_PATH: &str = "/auth/sign-in";
pub const ADMIN_HOME_PATH: &str = "/admin";

#[derive(Debug, Clone)]
pub enum Decision {
    /// Continue to the handler, writing the provider's cookie changes on the way out
    Allow {
        session: Option<Session>,
        cookies: CookieMutations,
    },
    RedirectTo {
        location: String,
        cookies: CookieMutations,
    },
}

impl Decision {
    pub fn cookies(&self) -> &CookieMutations {
        match self {
            Self::Allow { cookies, .. } | Self::RedirectTo { cookies, .. } => cookies,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::RedirectTo { location, .. } => Some(location),
            Self::Allow { .. } => None,
        }
    }
}

/// Decide whether a request may proceed.
///
/// A failing lookup counts as "no session": protected paths redirect to sign-in and
/// the sign-in page stays reachable.
pub fn authorize(
    path: &str,
    query: Option<&str>,
    jar: &CookieJar,
    provider: &dyn SessionProvider,
) -> Decision {
    let (session, cookies) = match provider.get_session(jar) {
        Ok(lookup) => (lookup.session, lookup.cookies),
        Err(e) => {
            tracing::warn!("Session lookup failed for {}, treating as signed out: {}", path, e);
            (None, CookieMutations::new())
        }
    };

    if classify(path) != RouteClass::AdminOrAuth {
        return Decision::Allow { session, cookies };
    }

    let normalized = normalize_path(path);

    if normalized.starts_with(ADMIN_PREFIX) && session.is_none() {
        tracing::debug!("No session for {}, redirecting to sign-in", normalized);
        return Decision::RedirectTo {
            location: with_query(SIGN_IN_PATH, query),
            cookies,
        };
    }

    if normalized == SIGN_IN_PATH && session.is_some() {
        tracing::debug!("Already signed in, redirecting away from sign-in");
        return Decision::RedirectTo {
            location: with_query(ADMIN_HOME_PATH, query),
            cookies,
        };
    }

    Decision::Allow { session, cookies }
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    }
}
