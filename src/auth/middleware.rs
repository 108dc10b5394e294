//! Authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use super::gate::SIGN_IN_PATH;
use super::session::Session;

/// The signed-in admin for this request.
///
/// The edge gate resolves the session and stores it in the request extensions;
/// this reads it back. A request that reaches an admin handler without one is
/// sent to sign-in.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(AdminSession(session.clone())),
            None => {
                tracing::debug!("No gated session on {}, redirecting to sign-in", parts.uri.path());
                Err(Redirect::temporary(SIGN_IN_PATH).into_response())
            }
        }
    }
}
