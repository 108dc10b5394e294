//! Handler-level errors and their HTTP responses.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::auth::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        let status = match self {
            Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Session(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, "Something went wrong").into_response()
    }
}

/// Render a template into an HTML response body
pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
