use dormant_scheduler::RepositoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("unknown course: {course_id}")]
    UnknownCourse { course_id: String },

    #[error("schedule not found: {id}")]
    ScheduleNotFound { id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for RepositoryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(_) => RepositoryError::Unavailable(e.to_string()),
            _ => RepositoryError::Query(e.to_string()),
        }
    }
}
