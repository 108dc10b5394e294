//! Edge middleware: the single per-request entry point.
//!
//! The route matcher decides whether a request is handled here at all. Matched
//! requests are classified and dispatched to exactly one branch, chosen by the
//! first rule whose predicate accepts the route class.

use axum::{
    extract::{Request, State},
    http::{header::ACCEPT_LANGUAGE, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::classifier::{classify, RouteClass};
use super::matcher::RouteMatcher;
use crate::auth::gate::{self, Decision};
use crate::locale::{Locale, LocaleOutcome, LocaleRequest, LocaleSettings};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    SessionGate,
    LocaleNegotiation,
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeRule {
    pub name: &'static str,
    pub applies: fn(RouteClass) -> bool,
    pub branch: Branch,
}

fn is_admin_or_auth(class: RouteClass) -> bool {
    class == RouteClass::AdminOrAuth
}

fn any_class(_: RouteClass) -> bool {
    true
}

/// Evaluation order matters: the session gate claims admin/auth paths before the
/// locale catch-all sees them.
pub const DEFAULT_RULES: [EdgeRule; 2] = [
    EdgeRule {
        name: "session-gate",
        applies: is_admin_or_auth,
        branch: Branch::SessionGate,
    },
    EdgeRule {
        name: "locale",
        applies: any_class,
        branch: Branch::LocaleNegotiation,
    },
];

#[derive(Debug, Clone)]
pub struct EdgeRouter {
    matcher: RouteMatcher,
    rules: Vec<EdgeRule>,
}

impl EdgeRouter {
    pub fn new(locales: &LocaleSettings) -> Self {
        Self::with_rules(RouteMatcher::new(locales), DEFAULT_RULES.to_vec())
    }

    pub fn with_rules(matcher: RouteMatcher, rules: Vec<EdgeRule>) -> Self {
        Self { matcher, rules }
    }

    /// The branch for a path, or `None` when the edge does not apply.
    pub fn select(&self, path: &str) -> Option<Branch> {
        if !self.matcher.matches(path) {
            return None;
        }
        let class = classify(path);
        let rule = self.rules.iter().find(|rule| (rule.applies)(class))?;
        tracing::debug!("{} -> {:?} via rule '{}'", path, class, rule.name);
        Some(rule.branch)
    }
}

pub async fn edge(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match state.edge.select(&path) {
        None => next.run(request).await,
        Some(Branch::SessionGate) => session_branch(&state, &path, jar, request, next).await,
        Some(Branch::LocaleNegotiation) => locale_branch(&state, &path, jar, request, next).await,
    }
}

async fn session_branch(
    state: &AppState,
    path: &str,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let query = request.uri().query().map(str::to_string);

    match gate::authorize(path, query.as_deref(), &jar, state.sessions.as_ref()) {
        Decision::Allow { session, cookies } => {
            if let Some(session) = session {
                request.extensions_mut().insert(session);
            }
            let response = next.run(request).await;
            (cookies.into_jar(), response).into_response()
        }
        Decision::RedirectTo { location, cookies } => {
            (cookies.into_jar(), Redirect::temporary(&location)).into_response()
        }
    }
}

async fn locale_branch(
    state: &AppState,
    path: &str,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let locales = &state.settings.locales;
    let cookie_locale = jar.get(&locales.cookie_name).map(|c| c.value().to_string());
    let accept_language = request
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let query = request.uri().query().map(str::to_string);

    let outcome = locales.negotiate(&LocaleRequest {
        path,
        query: query.as_deref(),
        cookie_locale: cookie_locale.as_deref(),
        accept_language: accept_language.as_deref(),
    });
    let cookies = locales.remember(cookie_locale.as_deref(), outcome.locale());

    match outcome {
        LocaleOutcome::Redirect { location, .. } => {
            (cookies.into_jar(), Redirect::temporary(&location)).into_response()
        }
        LocaleOutcome::Rewrite {
            path_and_query,
            locale,
        } => {
            match path_and_query.parse::<Uri>() {
                Ok(uri) => *request.uri_mut() = uri,
                Err(e) => tracing::warn!("Cannot rewrite {} to {}: {}", path, path_and_query, e),
            }
            request.extensions_mut().insert(Locale(locale));
            let response = next.run(request).await;
            (cookies.into_jar(), response).into_response()
        }
        LocaleOutcome::Pass { locale } => {
            request.extensions_mut().insert(Locale(locale));
            let response = next.run(request).await;
            (cookies.into_jar(), response).into_response()
        }
    }
}
