use std::sync::Mutex;

use chrono::{Duration, SecondsFormat, Utc};
use dormant_core::types::UserId;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{Result, UserError};
use crate::types::IssuedSession;

const TOKEN_PREFIX: &str = "dms_";

/// Convert a configured lifetime in hours into a `Duration`.
pub fn session_ttl(hours: u64) -> Result<Duration> {
    i64::try_from(hours)
        .ok()
        .and_then(Duration::try_hours)
        .ok_or(UserError::InvalidTtl { hours })
}

/// Bearer-token sessions.
///
/// Tokens are opaque random strings handed to the client once; only their
/// SHA-256 digest is stored, so a leaked database cannot be replayed.
/// Timestamps are fixed-width UTC strings and compare correctly as text.
pub struct SessionManager {
    db: Mutex<Connection>,
}

impl SessionManager {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Mint a session for an existing user.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn issue(&self, user_id: &UserId, ttl: Duration) -> Result<IssuedSession> {
        let token = new_token();
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or(UserError::InvalidTtl {
            hours: ttl.num_hours().max(0) as u64,
        })?;

        let db = self.db.lock().unwrap();
        let known: bool = db.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
            params![user_id.as_str()],
            |row| row.get(0),
        )?;
        if !known {
            return Err(UserError::UnknownUser {
                user_id: user_id.to_string(),
            });
        }

        db.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![hash_token(&token), user_id.as_str(), stamp(now), stamp(expires_at)],
        )?;
        info!(expires_at = %expires_at, "session issued");

        Ok(IssuedSession {
            token,
            user_id: user_id.to_string(),
            expires_at,
        })
    }

    /// Look up the user behind a bearer token. Unknown and expired tokens
    /// both resolve to `None`.
    pub fn resolve(&self, token: &str) -> Result<Option<UserId>> {
        let db = self.db.lock().unwrap();
        let user_id: Option<String> = db
            .query_row(
                "SELECT user_id FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
                params![hash_token(token), stamp(Utc::now())],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id.map(UserId::from))
    }

    /// Invalidate a token. Returns `false` if it was not known.
    #[instrument(skip_all)]
    pub fn revoke(&self, token: &str) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let removed = db.execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![hash_token(token)],
        )?;
        debug!(removed, "session revoked");
        Ok(removed > 0)
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let removed = db.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![stamp(Utc::now())],
        )?;
        if removed > 0 {
            info!(removed, "expired sessions purged");
        }
        Ok(removed)
    }
}

fn new_token() -> String {
    format!(
        "{TOKEN_PREFIX}{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn stamp(at: chrono::DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
