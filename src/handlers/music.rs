//! Admin background music listing.
//!
//! `tracks` is always present so clients can treat it as authoritative whatever
//! the status code.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::io;
use std::path::Path;

use crate::config::MUSIC_PUBLIC_PREFIX;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TrackListing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub tracks: Vec<String>,
}

/// Public URLs of the `.mp3` files directly inside `dir`, sorted by name.
pub async fn list_tracks(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_lowercase().ends_with(".mp3") {
            names.push(name);
        }
    }

    names.sort();
    Ok(names
        .iter()
        .map(|name| format!("{}/{}", MUSIC_PUBLIC_PREFIX, urlencoding::encode(name)))
        .collect())
}

/// GET /api/admin/music
pub async fn list_music(State(state): State<AppState>) -> (StatusCode, Json<TrackListing>) {
    match list_tracks(&state.settings.music_dir).await {
        Ok(tracks) => (StatusCode::OK, Json(TrackListing { error: None, tracks })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => (
            StatusCode::OK,
            Json(TrackListing {
                error: None,
                tracks: Vec::new(),
            }),
        ),
        Err(e) => {
            tracing::error!(
                "Unable to list admin music tracks in {}: {}",
                state.settings.music_dir.display(),
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TrackListing {
                    error: Some("Unable to load admin music"),
                    tracks: Vec::new(),
                }),
            )
        }
    }
}
