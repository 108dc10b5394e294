//! Auth database operations (users, sessions tables).
//!
//! ## Migration System
//!
//! Each migration checks the current schema version, runs its SQL inside a
//! transaction and records the new version in `db_version`. Migrations only run
//! once; a fresh database runs all of them in order.
//!
//! Session rows are keyed by the SHA-256 digest of the cookie token, never the
//! token itself. A rotated row remembers its previous digest so requests already
//! in flight with the old cookie still resolve for [`ROTATION_GRACE_SECS`].

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

/// Current schema version
/// Increment this when adding a new migration
pub const AUTH_DB_VERSION: i32 = 3;

/// How long a pre-rotation cookie keeps resolving to its rotated session
pub const ROTATION_GRACE_SECS: i64 = 60;

/// A live session joined with its user
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub user_id: i64,
    pub username: String,
    pub expires_at: DateTime<Utc>,
    /// Matched through the digest the session had before its last rotation
    pub previous: bool,
}

/// Timestamps are stored as fixed-width RFC 3339 UTC so string comparison orders them
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Initialize the auth schema with version-gated migrations
pub fn init_auth_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS db_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL,
            description TEXT
        );
        "#,
    )?;

    let current_version = get_schema_version(conn)?;
    tracing::debug!("auth schema version: {}", current_version);

    if current_version < 1 {
        migrate_v0_to_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v1_to_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v2_to_v3(conn)?;
    }

    Ok(())
}

/// v0→v1: Create base tables (users, sessions)
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v0→v1: Create users and sessions");

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            last_login_at TEXT
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
        "#,
    )?;
    record_version(&tx, 1, "Create users and sessions")?;
    tx.commit()
}

/// v1→v2: Track last access and index expiry for cleanup
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v1→v2: Session last access tracking");

    let tx = conn.unchecked_transaction()?;
    add_column_if_missing(&tx, "sessions", "last_access_at", "TEXT")?;
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);",
    )?;
    record_version(&tx, 2, "Session last access tracking")?;
    tx.commit()
}

/// v2→v3: Remember the digest replaced by the last rotation
fn migrate_v2_to_v3(conn: &Connection) -> Result<()> {
    tracing::info!("Running migration v2→v3: Session rotation grace");

    let tx = conn.unchecked_transaction()?;
    add_column_if_missing(&tx, "sessions", "previous_id", "TEXT")?;
    add_column_if_missing(&tx, "sessions", "rotated_at", "TEXT")?;
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_sessions_previous_id ON sessions(previous_id);",
    )?;
    record_version(&tx, 3, "Session rotation grace")?;
    tx.commit()
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO db_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        params![version, timestamp(Utc::now()), description],
    )?;
    Ok(())
}

/// Highest applied migration, 0 for a fresh database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM db_version",
        [],
        |row| row.get(0),
    )
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    conn.prepare(&format!("SELECT {} FROM {} LIMIT 0", column, table))
        .is_ok()
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<()> {
    if !column_exists(conn, table, column) {
        conn.execute(
            &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, definition),
            [],
        )?;
    }
    Ok(())
}

// ==================== Users ====================

pub fn create_user(conn: &Connection, username: &str, password_hash: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
        params![username, password_hash, timestamp(Utc::now())],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Returns (user_id, password_hash)
pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<(i64, String)>> {
    conn.query_row(
        "SELECT id, password_hash FROM users WHERE username = ?1",
        params![username],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

pub fn username_exists(conn: &Connection, username: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn update_last_login(conn: &Connection, user_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
        params![timestamp(Utc::now()), user_id],
    )?;
    Ok(())
}

// ==================== Sessions ====================

pub fn create_session(
    conn: &Connection,
    user_id: i64,
    session_digest: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    let now = timestamp(Utc::now());
    conn.execute(
        "INSERT INTO sessions (id, user_id, created_at, expires_at, last_access_at) VALUES (?1, ?2, ?3, ?4, ?3)",
        params![session_digest, user_id, now, timestamp(expires_at)],
    )?;
    Ok(())
}

/// Validate a session and touch its last access time.
///
/// Falls back to the pre-rotation digest while the last rotation is younger
/// than [`ROTATION_GRACE_SECS`].
pub fn get_session(
    conn: &Connection,
    session_digest: &str,
    now: DateTime<Utc>,
) -> Result<Option<SessionRow>> {
    let grace_start = timestamp(now - Duration::seconds(ROTATION_GRACE_SECS));
    let now = timestamp(now);
    let row = conn
        .query_row(
            r#"
            SELECT u.id, u.username, s.expires_at, s.id
            FROM sessions s
            JOIN users u ON s.user_id = u.id
            WHERE s.expires_at > ?2
              AND (s.id = ?1 OR (s.previous_id = ?1 AND s.rotated_at > ?3))
            ORDER BY s.id = ?1 DESC
            LIMIT 1
            "#,
            params![session_digest, now, grace_start],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, username, expires_at, id)) = row else {
        return Ok(None);
    };

    // Last access is informational; a failed touch must not invalidate the session
    if let Err(e) = conn.execute(
        "UPDATE sessions SET last_access_at = ?1 WHERE id = ?2",
        params![now, id],
    ) {
        tracing::warn!("Failed to touch session last access: {}", e);
    }

    Ok(parse_timestamp(&expires_at).map(|expires_at| SessionRow {
        user_id,
        username,
        expires_at,
        previous: id != session_digest,
    }))
}

/// Replace a session's id and extend its expiry, keeping the old id for the
/// grace window. Returns false if the old id is gone.
pub fn rotate_session(
    conn: &Connection,
    old_digest: &str,
    new_digest: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool> {
    let updated = conn.execute(
        r#"
        UPDATE sessions
        SET id = ?1, previous_id = id, rotated_at = ?3, expires_at = ?2, last_access_at = ?3
        WHERE id = ?4
        "#,
        params![
            new_digest,
            timestamp(expires_at),
            timestamp(Utc::now()),
            old_digest
        ],
    )?;
    Ok(updated > 0)
}

/// Delete a session (sign-out), whichever of its digests the cookie carries
pub fn delete_session(conn: &Connection, session_digest: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM sessions WHERE id = ?1 OR previous_id = ?1",
        params![session_digest],
    )?;
    Ok(())
}

/// Cleanup expired sessions, returns count of deleted sessions
pub fn cleanup_expired_sessions(conn: &Connection) -> Result<usize> {
    conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![timestamp(Utc::now())],
    )
}
