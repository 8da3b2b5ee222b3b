use std::collections::HashMap;

use async_trait::async_trait;
use dormant_core::course::{Schedule, Section};
use dormant_core::types::UserId;
use thiserror::Error;

/// Failures reported by data-store collaborators.
///
/// The generator never retries these; retry policy belongs to the adapter.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but the query or write failed.
    #[error("store query failed: {0}")]
    Query(String),
}

/// Source of candidate sections for the generator.
///
/// Contract: one call fetches every requested course, and the returned map
/// holds an entry for every requested ID, empty when the course has no
/// sections. Section order within an entry must be stable between calls;
/// the search iterates it as given.
#[async_trait]
pub trait SectionRepository: Send + Sync {
    async fn fetch_sections_for_courses(
        &self,
        course_ids: &[String],
    ) -> Result<HashMap<String, Vec<Section>>, RepositoryError>;
}

/// Sink for generated schedules.
///
/// Called after the response is built; failures are logged, never surfaced
/// to the requester.
#[async_trait]
pub trait SchedulePersistence: Send + Sync {
    async fn save_generated(
        &self,
        user_id: &UserId,
        schedules: &[Schedule],
    ) -> Result<(), RepositoryError>;
}

/// Fixed set of sections held in memory, grouped by course.
///
/// Insertion order is preserved per course.
#[derive(Debug, Clone, Default)]
pub struct InMemorySectionRepository {
    by_course: HashMap<String, Vec<Section>>,
}

impl InMemorySectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sections(sections: impl IntoIterator<Item = Section>) -> Self {
        let mut repo = Self::new();
        for section in sections {
            repo.insert(section);
        }
        repo
    }

    pub fn insert(&mut self, section: Section) {
        self.by_course
            .entry(section.course_id.clone())
            .or_default()
            .push(section);
    }
}

#[async_trait]
impl SectionRepository for InMemorySectionRepository {
    async fn fetch_sections_for_courses(
        &self,
        course_ids: &[String],
    ) -> Result<HashMap<String, Vec<Section>>, RepositoryError> {
        Ok(course_ids
            .iter()
            .map(|id| (id.clone(), self.by_course.get(id).cloned().unwrap_or_default()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_course_gets_empty_entry() {
        let repo = InMemorySectionRepository::from_sections([
            Section::new("1", "CS110"),
            Section::new("2", "CS110"),
        ]);
        let ids = vec!["CS110".to_string(), "ART101".to_string()];
        let map = repo.fetch_sections_for_courses(&ids).await.unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map["CS110"].iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), ["1", "2"]);
        assert!(map["ART101"].is_empty());
    }
}
