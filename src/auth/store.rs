//! SQLite-backed session provider.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::db as auth_db;
use super::password;
use super::session::{
    generate_session_token, token_digest, Session, SessionError, SessionLookup,
    SessionProvider, SESSION_CLEANUP_THRESHOLD, SESSION_COOKIE_NAME,
};
use crate::config::AuthSettings;
use crate::cookies::CookieMutations;

/// Shared auth database connection
pub type AuthDb = Arc<Mutex<Connection>>;

pub struct SqliteSessionStore {
    db: AuthDb,
    ttl_hours: i64,
    refresh_within_hours: i64,
    secure_cookies: bool,
}

impl SqliteSessionStore {
    pub fn new(conn: Connection, auth: &AuthSettings) -> Result<Self, SessionError> {
        auth_db::init_auth_schema(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            ttl_hours: auth.session_ttl_hours,
            refresh_within_hours: auth.refresh_within_hours,
            secure_cookies: auth.secure_cookies,
        })
    }

    pub fn open(path: &Path, auth: &AuthSettings) -> Result<Self, SessionError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create database directory {}: {}", parent.display(), e);
            }
        }
        Self::new(Connection::open(path)?, auth)
    }

    pub fn open_in_memory(auth: &AuthSettings) -> Result<Self, SessionError> {
        Self::new(Connection::open_in_memory()?, auth)
    }

    /// Create the bootstrap admin account if it does not exist yet.
    /// Returns true when an account was created.
    pub fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, SessionError> {
        // One guard for the check and the insert
        let conn = self.lock()?;
        if auth_db::username_exists(&conn, username)? {
            return Ok(false);
        }
        let hash = password::hash_password(password)
            .map_err(|e| SessionError::PasswordHash(e.to_string()))?;
        auth_db::create_user(&conn, username, &hash)?;
        tracing::info!("Created admin account '{}'", username);
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn db(&self) -> AuthDb {
        Arc::clone(&self.db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SessionError> {
        self.db.lock().map_err(|_| SessionError::LockPoisoned)
    }

    fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::hours(self.ttl_hours))
            .build()
    }

    fn clear_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build()
    }
}

impl SessionProvider for SqliteSessionStore {
    fn get_session(&self, jar: &CookieJar) -> Result<SessionLookup, SessionError> {
        let Some(token) = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string()) else {
            return Ok(SessionLookup::default());
        };
        if token.is_empty() {
            return Ok(SessionLookup::default());
        }

        let conn = self.lock()?;
        let now = Utc::now();

        if rand::random::<u8>() < SESSION_CLEANUP_THRESHOLD {
            match auth_db::cleanup_expired_sessions(&conn) {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Cleaned up {} expired sessions", n),
                Err(e) => tracing::warn!("Expired session cleanup failed: {}", e),
            }
        }

        let digest = token_digest(&token);
        let mut cookies = CookieMutations::new();

        let Some(row) = auth_db::get_session(&conn, &digest, now)? else {
            // Stale or forged cookie: drop it so the client stops sending it
            cookies.remove(Self::clear_cookie());
            return Ok(SessionLookup {
                session: None,
                cookies,
            });
        };

        let mut session = Session {
            id: token,
            user_id: row.user_id.to_string(),
            username: row.username,
            expires_at: row.expires_at,
        };

        // A pre-rotation cookie from a concurrent request: the response that
        // rotated already carries the new cookie
        if row.previous {
            tracing::debug!("Session for user {} matched its previous token", session.username);
        } else if row.expires_at - now < Duration::hours(self.refresh_within_hours) {
            let new_token = generate_session_token();
            let expires_at = now + Duration::hours(self.ttl_hours);
            if auth_db::rotate_session(&conn, &digest, &token_digest(&new_token), expires_at)? {
                tracing::debug!("Rotated session for user {}", session.username);
                cookies.set(self.session_cookie(&new_token));
                session.id = new_token;
                session.expires_at = expires_at;
            }
        }

        Ok(SessionLookup {
            session: Some(session),
            cookies,
        })
    }

    fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<SessionLookup>, SessionError> {
        let user = auth_db::get_user_by_username(&*self.lock()?, username)?;
        let Some((user_id, stored_hash)) = user else {
            return Ok(None);
        };

        // Argon2 is slow; verify without holding the database lock
        if !password::verify_password(password, &stored_hash) {
            return Ok(None);
        }

        let token = generate_session_token();
        let expires_at = Utc::now() + Duration::hours(self.ttl_hours);
        {
            let conn = self.lock()?;
            auth_db::create_session(&conn, user_id, &token_digest(&token), expires_at)?;
            if let Err(e) = auth_db::update_last_login(&conn, user_id) {
                tracing::warn!("Failed to update last login for user {}: {}", user_id, e);
            }
        }

        let mut cookies = CookieMutations::new();
        cookies.set(self.session_cookie(&token));
        Ok(Some(SessionLookup {
            session: Some(Session {
                id: token,
                user_id: user_id.to_string(),
                username: username.to_string(),
                expires_at,
            }),
            cookies,
        }))
    }

    fn sign_out(&self, jar: &CookieJar) -> Result<CookieMutations, SessionError> {
        if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
            auth_db::delete_session(&*self.lock()?, &token_digest(cookie.value()))?;
        }
        let mut cookies = CookieMutations::new();
        cookies.remove(Self::clear_cookie());
        Ok(cookies)
    }
}
