use thiserror::Error;

use crate::repository::RepositoryError;

/// Coarse classification callers use to pick a response.
///
/// `Input` means the request itself was wrong and retrying it unchanged is
/// pointless. `Cancelled` covers both caller cancellation and the search
/// deadline; a smaller course set or a larger budget may succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Upstream,
    Cancelled,
    Internal,
}

/// Errors that can occur while generating schedules.
///
/// An infeasible request is not an error: it yields an empty result.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The request named no courses.
    #[error("No courses requested")]
    NoCourses,

    /// More courses than the configured maximum.
    #[error("Too many courses selected: {requested} (max {max})")]
    TooManyCourses { requested: usize, max: usize },

    /// A blank course identifier.
    #[error("Invalid course id: {0:?}")]
    InvalidCourseId(String),

    /// The same course appears twice in one request.
    #[error("Course requested more than once: {0}")]
    DuplicateCourse(String),

    /// The section repository failed.
    #[error("Section repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The repository returned no entry at all for a requested course.
    #[error("Section repository omitted requested course: {course_id}")]
    MissingCourse { course_id: String },

    /// Sections violate the meeting invariants.
    #[error("Invalid section data: {0}")]
    InvalidSectionData(String),

    /// The caller cancelled the request.
    #[error("Schedule generation cancelled")]
    Cancelled,

    /// The search exceeded its wall-clock budget.
    #[error("Schedule generation timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The blocking search task panicked or was aborted.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::NoCourses
            | SchedulerError::TooManyCourses { .. }
            | SchedulerError::InvalidCourseId(_)
            | SchedulerError::DuplicateCourse(_) => ErrorKind::Input,
            SchedulerError::Repository(_)
            | SchedulerError::MissingCourse { .. }
            | SchedulerError::InvalidSectionData(_) => ErrorKind::Upstream,
            SchedulerError::Cancelled | SchedulerError::Timeout { .. } => ErrorKind::Cancelled,
            SchedulerError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Short error code string sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::NoCourses => "NO_COURSES",
            SchedulerError::TooManyCourses { .. } => "TOO_MANY_COURSES",
            SchedulerError::InvalidCourseId(_) => "INVALID_COURSE_ID",
            SchedulerError::DuplicateCourse(_) => "DUPLICATE_COURSE",
            SchedulerError::Repository(_) => "REPOSITORY_ERROR",
            SchedulerError::MissingCourse { .. } => "MISSING_COURSE",
            SchedulerError::InvalidSectionData(_) => "INVALID_SECTION_DATA",
            SchedulerError::Cancelled => "CANCELLED",
            SchedulerError::Timeout { .. } => "TIMEOUT",
            SchedulerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
