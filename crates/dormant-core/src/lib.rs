//! `dormant-core`: shared domain model, identifiers, configuration and errors.

pub mod config;
pub mod course;
pub mod error;
pub mod types;

pub use config::DormantConfig;
pub use course::{Course, Meeting, Schedule, Section};
pub use error::{DormantError, Result};
pub use types::{ScheduleId, UserId};
