//! SQLite persistence for the course catalog and user schedules.
//!
//! `CourseStore` is the section source for schedule generation;
//! `ScheduleStore` keeps saved and generated schedules per user.
//! Each store owns its own connection.

pub mod courses;
pub mod db;
pub mod error;
pub mod import;
pub mod schedules;

pub use courses::CourseStore;
pub use db::init_db;
pub use error::{Result, StoreError};
pub use import::{CatalogImport, ImportSummary};
pub use schedules::{ScheduleOrigin, ScheduleStore};
