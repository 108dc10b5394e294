//! Test utilities for app setup.
//!
//! Builds a full [`AppState`] on top of the real session store, with the
//! database and music directory in one temporary directory.

use chrono::{Duration, Utc};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::auth::db as auth_db;
use crate::auth::session::{generate_session_token, token_digest};
use crate::auth::SqliteSessionStore;
use crate::config::Settings;
use crate::state::AppState;

pub const ADMIN_USERNAME: &str = "ub";
pub const ADMIN_PASSWORD: &str = "magnetoscope";

/// Test environment with a seeded admin account.
///
/// The temporary directory is removed when dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for the database and music files)
    pub temp: TempDir,
    pub store: Arc<SqliteSessionStore>,
    pub settings: Settings,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");

        let mut settings = Settings::default();
        settings.database_path = temp.path().join("studio.db");
        settings.music_dir = temp.path().join("admin-music");
        settings.static_dir = temp.path().join("static");
        std::fs::create_dir_all(&settings.music_dir).expect("create music dir");

        let store = SqliteSessionStore::open(&settings.database_path, &settings.auth)
            .expect("open session store");
        store
            .ensure_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
            .expect("seed admin");

        Self {
            temp,
            store: Arc::new(store),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.store.clone(), self.settings.clone())
    }

    /// Write an (empty) file into the music directory.
    pub fn add_track(&self, name: &str) {
        std::fs::write(self.settings.music_dir.join(name), b"").expect("write track");
    }

    /// Insert a session for the admin that expires in `hours`, returning its cookie token.
    pub fn session_expiring_in(&self, hours: i64) -> String {
        let token = generate_session_token();
        let db = self.store.db();
        let conn = db.lock().expect("lock db");
        let (user_id, _) = auth_db::get_user_by_username(&conn, ADMIN_USERNAME)
            .expect("query admin")
            .expect("admin exists");
        auth_db::create_session(
            &conn,
            user_id,
            &token_digest(&token),
            Utc::now() + Duration::hours(hours),
        )
        .expect("insert session");
        token
    }
}
