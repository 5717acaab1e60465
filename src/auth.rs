//! Staff accounts and bearer sessions.
//!
//! Login checks a PBKDF2 verifier and issues a random bearer token. Only the
//! SHA-256 of the token is stored, so a leaked database cannot be replayed.
//! Every authenticated request resolves its token back into a `StaffUser`.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::config::BootstrapAdmin;
use crate::crypto::{generate_token, hash_token, PasswordHash, KEY_LENGTH, SALT_LENGTH};
use crate::db::{is_unique_violation, DatabaseError};
use crate::models::StaffUser;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Session not recognized")]
    UnknownSession,
    #[error("Session expired")]
    SessionExpired,
    #[error("Session lifetime of {0} hours is out of range")]
    SessionTtl(i64),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Database(DatabaseError::Sqlite(err))
    }
}

/// Issued on login. `token` is shown to the client once and never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: String,
    pub user: StaffUser,
}

fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    display_name: &str,
    password: &str,
    iterations: u32,
) -> Result<StaffUser, DatabaseError> {
    let username = normalize_username(username);
    if username.is_empty() {
        return Err(DatabaseError::MissingFields(vec!["username".into()]));
    }
    if password.is_empty() {
        return Err(DatabaseError::MissingFields(vec!["password".into()]));
    }

    let verifier = PasswordHash::new(password, iterations);
    conn.execute(
        "INSERT INTO staff_users (username, display_name, password_hash, password_salt,
         password_iterations) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            username,
            display_name.trim(),
            &verifier.hash[..],
            &verifier.salt[..],
            verifier.iterations,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            DatabaseError::ConstraintViolation(format!("username {username} is taken"))
        } else {
            DatabaseError::Sqlite(e)
        }
    })?;

    Ok(StaffUser {
        id: conn.last_insert_rowid(),
        username,
        display_name: display_name.trim().to_string(),
    })
}

pub fn count_users(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM staff_users", [], |row| row.get(0))?)
}

/// Create the configured admin when the office has no staff accounts yet.
pub fn ensure_bootstrap_admin(
    conn: &Connection,
    admin: &BootstrapAdmin,
    iterations: u32,
) -> Result<Option<StaffUser>, DatabaseError> {
    if count_users(conn)? > 0 {
        return Ok(None);
    }
    let user = create_user(conn, &admin.username, "Administrador", &admin.password, iterations)?;
    tracing::info!(username = %user.username, "bootstrap admin created");
    Ok(Some(user))
}

/// Verify credentials and open a session valid for `ttl_hours`.
pub fn login(
    conn: &Connection,
    username: &str,
    password: &str,
    ttl_hours: i64,
) -> Result<IssuedSession, AuthError> {
    let username = normalize_username(username);
    let row = conn
        .query_row(
            "SELECT id, display_name, password_hash, password_salt, password_iterations
             FROM staff_users WHERE username = ?1",
            params![username],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, [u8; KEY_LENGTH]>(2)?,
                    row.get::<_, [u8; SALT_LENGTH]>(3)?,
                    row.get::<_, u32>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, display_name, hash, salt, iterations)) = row else {
        // Same PBKDF2 cost as a real account so response time does not
        // reveal which usernames exist.
        let decoy_iterations: u32 = conn.query_row(
            "SELECT COALESCE(MAX(password_iterations), 1) FROM staff_users",
            [],
            |row| row.get(0),
        )?;
        let decoy = PasswordHash {
            hash: [0u8; KEY_LENGTH],
            salt: [0u8; SALT_LENGTH],
            iterations: decoy_iterations,
        };
        let _ = decoy.verify(password);
        tracing::warn!(username = %username, "login for unknown user");
        return Err(AuthError::InvalidCredentials);
    };

    let verifier = PasswordHash {
        hash,
        salt,
        iterations,
    };
    if !verifier.verify(password) {
        tracing::warn!(username = %username, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = generate_token();
    let now = Utc::now();
    let expires_at = Duration::try_hours(ttl_hours)
        .filter(|_| ttl_hours > 0)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or(AuthError::SessionTtl(ttl_hours))?;
    conn.execute(
        "INSERT INTO staff_sessions (token_hash, user_id, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            &hash_token(&token)[..],
            user_id,
            now.to_rfc3339(),
            expires_at.to_rfc3339(),
        ],
    )?;

    tracing::info!(user_id, "staff login");
    Ok(IssuedSession {
        token,
        expires_at: expires_at.to_rfc3339(),
        user: StaffUser {
            id: user_id,
            username,
            display_name,
        },
    })
}

/// Resolve a bearer token to its staff user. Expired sessions are removed.
pub fn resolve_session(conn: &Connection, token: &str) -> Result<StaffUser, AuthError> {
    let token_hash = hash_token(token);
    let row = conn
        .query_row(
            "SELECT u.id, u.username, u.display_name, s.expires_at
             FROM staff_sessions s
             JOIN staff_users u ON s.user_id = u.id
             WHERE s.token_hash = ?1",
            params![&token_hash[..]],
            |row| {
                Ok((
                    StaffUser {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        display_name: row.get(2)?,
                    },
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let (user, expires_at) = row.ok_or(AuthError::UnknownSession)?;
    let expired = DateTime::parse_from_rfc3339(&expires_at)
        .map(|t| t.with_timezone(&Utc) <= Utc::now())
        .unwrap_or(true);

    if expired {
        conn.execute(
            "DELETE FROM staff_sessions WHERE token_hash = ?1",
            params![&token_hash[..]],
        )?;
        return Err(AuthError::SessionExpired);
    }
    Ok(user)
}

/// End a session. Unknown tokens are ignored.
pub fn revoke_session(conn: &Connection, token: &str) -> Result<bool, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM staff_sessions WHERE token_hash = ?1",
        params![&hash_token(token)[..]],
    )?;
    Ok(removed > 0)
}

/// Drop every expired session. Returns how many were removed.
pub fn purge_expired_sessions(conn: &Connection) -> Result<usize, DatabaseError> {
    let mut stmt = conn.prepare("SELECT token_hash, expires_at FROM staff_sessions")?;
    let now = Utc::now();
    let stale: Vec<Vec<u8>> = stmt
        .query_map([], |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?)))?
        .filter_map(Result::ok)
        .filter(|(_, expires_at)| {
            DateTime::parse_from_rfc3339(expires_at)
                .map(|t| t.with_timezone(&Utc) <= now)
                .unwrap_or(true)
        })
        .map(|(hash, _)| hash)
        .collect();

    for hash in &stale {
        conn.execute("DELETE FROM staff_sessions WHERE token_hash = ?1", params![hash])?;
    }
    if !stale.is_empty() {
        tracing::debug!(removed = stale.len(), "expired sessions purged");
    }
    Ok(stale.len())
}
