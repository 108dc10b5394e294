//! Session model and the session provider contract.

use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::cookies::CookieMutations;

pub const SESSION_COOKIE_NAME: &str = "ub_session";

/// Probability threshold for expired session cleanup (0-255, lower = less frequent)
/// Value of 25 means ~10% chance (25/256) on each session lookup
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

/// An authenticated admin session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Cookie token identifying the session
    pub id: String,
    /// Opaque user identifier
    pub user_id: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Result of a lookup: the session, if any, and cookie changes the provider made
/// while resolving it (refresh, rotation, clearing a stale cookie).
#[derive(Debug, Clone, Default)]
pub struct SessionLookup {
    pub session: Option<Session>,
    pub cookies: CookieMutations,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("session store lock poisoned")]
    LockPoisoned,
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// Backend that owns session state. The edge only reads sessions through it and
/// writes whatever cookie changes it returns onto the response.
pub trait SessionProvider: Send + Sync {
    /// Resolve the request's session, refreshing it when due.
    fn get_session(&self, jar: &CookieJar) -> Result<SessionLookup, SessionError>;

    /// Check credentials and open a session. `Ok(None)` for bad credentials.
    fn sign_in(&self, username: &str, password: &str)
        -> Result<Option<SessionLookup>, SessionError>;

    /// End the request's session. Always yields a cookie removal.
    fn sign_out(&self, jar: &CookieJar) -> Result<CookieMutations, SessionError>;
}

/// Generate a new session token
pub fn generate_session_token() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..32)
        .map(|_| {
            let idx = rng.random_range(0..36u8);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}

/// Storage key for a token
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
