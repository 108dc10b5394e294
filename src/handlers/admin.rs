//! Admin area pages. Reaching these requires a session from the edge gate.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::auth::AdminSession;
use crate::error::{render, AppError};
use crate::filters;
use crate::state::AppState;

/// Admin sections in menu order: (slug, title)
pub const ADMIN_SECTIONS: [(&str, &str); 3] = [
    ("portfolio", "Portfolio"),
    ("account", "Account"),
    ("settings", "Settings"),
];

#[derive(Debug, Clone)]
pub struct SectionLink {
    pub href: String,
    pub title: &'static str,
    pub current: bool,
}

#[derive(Template)]
#[template(path = "admin/home.html")]
pub struct AdminTemplate {
    pub username: String,
    pub sections: Vec<SectionLink>,
    pub heading: &'static str,
    /// Endpoint the background music player loads its track list from
    pub music_listing_url: &'static str,
}

/// `current` is the open section's slug, empty on the dashboard
fn admin_page(session: &AdminSession, current: &str, heading: &'static str) -> AdminTemplate {
    AdminTemplate {
        username: session.0.username.clone(),
        sections: ADMIN_SECTIONS
            .iter()
            .map(|&(slug, title)| SectionLink {
                href: format!("/admin/{}", slug),
                title,
                current: slug == current,
            })
            .collect(),
        heading,
        music_listing_url: "/api/admin/music",
    }
}

/// GET /admin
pub async fn admin_home(session: AdminSession) -> Result<Response, AppError> {
    Ok(render(&admin_page(&session, "", "Dashboard"))?.into_response())
}

/// GET /admin/{*section}
pub async fn admin_section(
    State(state): State<AppState>,
    session: AdminSession,
    Path(section): Path<String>,
) -> Result<Response, AppError> {
    let section = section.trim_end_matches('/');
    match ADMIN_SECTIONS.iter().find(|(slug, _)| *slug == section) {
        Some(&(slug, title)) => Ok(render(&admin_page(&session, slug, title))?.into_response()),
        None => {
            tracing::debug!("Unknown admin section '{}'", section);
            super::not_found(State(state), None).await
        }
    }
}
