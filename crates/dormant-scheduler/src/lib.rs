//! `dormant-scheduler`: conflict-free course schedule generation.
//!
//! # Overview
//!
//! Given a list of requested courses, the [`engine::ScheduleGenerator`]
//! fetches every candidate section in one repository call, groups them into
//! one bucket per course and runs a depth-first backtracking search that
//! picks exactly one section per course such that no two weekly meetings
//! overlap.
//!
//! # Components
//!
//! | Module      | Role                                                      |
//! |-------------|-----------------------------------------------------------|
//! | `conflict`  | Pure meeting / section overlap tests                      |
//! | `validate`  | Request and section-data checks                           |
//! | `search`    | Pruning backtracking search with cap, deadline, cancel    |
//! | `assemble`  | Combination → `Schedule` records                          |
//! | `engine`    | Orchestrator: validate, fetch, search, assemble, hand off |
//!
//! # Guarantees
//!
//! - Every schedule covers every requested course; a course without
//!   sections yields an empty (successful) result.
//! - Results come out in a fixed order (request order × bucket order), so a
//!   capped result is always the same prefix and is flagged `truncated`.
//! - No ranking: "best schedule" preferences are out of scope.

pub mod assemble;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod repository;
pub mod search;
pub mod types;
pub mod validate;

pub use conflict::{conflicts, sections_conflict};
pub use engine::ScheduleGenerator;
pub use error::{ErrorKind, Result, SchedulerError};
pub use repository::{InMemorySectionRepository, RepositoryError, SchedulePersistence, SectionRepository};
pub use types::{Combination, CourseBucket, Generation, SearchLimits, SearchOutcome, SearchStats};
