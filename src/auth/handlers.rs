//! Sign-in and sign-out handlers.

use askama::Template;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use super::gate::{ADMIN_HOME_PATH, SIGN_IN_PATH};
use super::session::SESSION_COOKIE_NAME;
use crate::cookies::CookieMutations;
use crate::error::{render, AppError};
use crate::filters;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub error: Option<String>,
    pub username: String,
}

#[derive(Deserialize)]
pub struct SignInForm {
    pub username: String,
    pub password: String,
}

fn sign_in_form(status: StatusCode, username: &str, error: &str) -> Result<Response, AppError> {
    let template = SignInTemplate {
        error: Some(error.to_string()),
        username: username.to_string(),
    };
    Ok((status, render(&template)?).into_response())
}

/// GET /auth/sign-in - Show sign-in page
pub async fn sign_in_page() -> Result<Response, AppError> {
    let template = SignInTemplate {
        error: None,
        username: String::new(),
    };
    Ok(render(&template)?.into_response())
}

/// POST /auth/sign-in - Check credentials and open a session
pub async fn sign_in_submit(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return sign_in_form(
            StatusCode::UNPROCESSABLE_ENTITY,
            username,
            "Username and password are required",
        );
    }

    match state.sessions.sign_in(username, &form.password) {
        Ok(Some(lookup)) => {
            tracing::info!("Admin '{}' signed in", username);
            Ok((lookup.cookies.into_jar(), Redirect::to(ADMIN_HOME_PATH)).into_response())
        }
        Ok(None) => {
            tracing::info!("Rejected sign-in for '{}'", username);
            sign_in_form(
                StatusCode::UNAUTHORIZED,
                username,
                "Invalid username or password",
            )
        }
        Err(e) => {
            tracing::error!("Sign-in failed for '{}': {}", username, e);
            sign_in_form(
                StatusCode::SERVICE_UNAVAILABLE,
                username,
                "Sign-in is temporarily unavailable",
            )
        }
    }
}

/// POST /api/auth/sign-out - End the session and return to sign-in
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    let cookies = match state.sessions.sign_out(&jar) {
        Ok(cookies) => cookies,
        Err(e) => {
            // The client still loses its cookie; the row expires on its own
            tracing::warn!("Failed to delete session during sign-out: {}", e);
            let mut cookies = CookieMutations::new();
            cookies.remove(Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build());
            cookies
        }
    };

    let location = match request_origin(&headers, state.settings.trust_proxy_headers) {
        Some(origin) => format!("{}{}", origin, SIGN_IN_PATH),
        None => SIGN_IN_PATH.to_string(),
    };
    tracing::info!("Signed out, redirecting to {}", location);

    (cookies.into_jar(), Redirect::to(&location))
}

fn header_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `scheme://host` of the request. Forwarding headers are only read when
/// `trust_proxy` is set; otherwise `Host` decides and the scheme is http.
pub fn request_origin(headers: &HeaderMap, trust_proxy: bool) -> Option<String> {
    let forwarded = |name: &str| trust_proxy.then(|| header_value(headers, name)).flatten();
    let host = forwarded("x-forwarded-host").or_else(|| header_value(headers, "host"))?;
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
    {
        return None;
    }

    let scheme = match forwarded("x-forwarded-proto") {
        Some("https") => "https",
        _ => "http",
    };
    Some(format!("{}://{}", scheme, host))
}
