//! In-memory course catalog for the search bar.
//!
//! The whole catalog is loaded once at startup and replaced wholesale on
//! reload; lookups never touch the database.

pub mod cache;

pub use cache::{CatalogCache, CatalogSnapshot, CourseSummary};
