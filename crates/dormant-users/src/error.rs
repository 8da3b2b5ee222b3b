use thiserror::Error;

/// Errors from the user directory and session store.
#[derive(Debug, Error)]
pub enum UserError {
    /// No user with this id.
    #[error("user not found: {id}")]
    NotFound { id: String },

    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Sessions can only be issued for users that exist.
    #[error("cannot issue session for unknown user {user_id}")]
    UnknownUser { user_id: String },

    /// The session lifetime does not fit in a timestamp.
    #[error("session ttl of {hours}h is out of range")]
    InvalidTtl { hours: u64 },
}

pub type Result<T> = std::result::Result<T, UserError>;
