use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, instrument};

use crate::error::{Result, UserError};
use crate::types::User;

/// User profiles, keyed by the identity provider's user id.
pub struct UserDirectory {
    db: Mutex<Connection>,
}

impl UserDirectory {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Create the user or refresh its profile fields. Called on every login.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO users (id, name, email, avatar_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at",
            params![user.id, user.name, user.email, user.avatar_url, now],
        )?;
        debug!("user saved");
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> Result<User> {
        self.find_user(user_id)?.ok_or_else(|| UserError::NotFound {
            id: user_id.to_string(),
        })
    }

    pub fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        let db = self.db.lock().unwrap();
        let user = db
            .query_row(
                "SELECT id, name, email, avatar_url FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        avatar_url: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
