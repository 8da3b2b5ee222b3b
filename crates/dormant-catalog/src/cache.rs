use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dormant_core::course::Course;
use serde::Serialize;
use tracing::{debug, info};

/// One immutable generation of the catalog.
///
/// Search keys are lowercased once at build time so queries only lowercase
/// the needle.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    version: u64,
    courses: Vec<Course>,
    keys: Vec<(String, String)>,
    by_id: HashMap<String, usize>,
}

/// Lightweight view returned by catalog search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub credits: u32,
}

impl From<&Course> for CourseSummary {
    fn from(c: &Course) -> Self {
        Self {
            id: c.id.clone(),
            title: c.title.clone(),
            credits: c.credits,
        }
    }
}

impl CatalogSnapshot {
    fn build(version: u64, courses: Vec<Course>) -> Self {
        let keys = courses
            .iter()
            .map(|c| (c.id.to_lowercase(), c.title.to_lowercase()))
            .collect();
        let by_id = courses
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self {
            version,
            courses,
            keys,
            by_id,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn get(&self, course_id: &str) -> Option<&Course> {
        self.by_id.get(course_id).map(|&i| &self.courses[i])
    }

    /// Case-insensitive substring match on course id or title, in catalog
    /// order, at most `limit` hits. A blank query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Course> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.keys
            .iter()
            .zip(&self.courses)
            .filter(|((id, title), _)| id.contains(&needle) || title.contains(&needle))
            .map(|(_, course)| course)
            .take(limit)
            .collect()
    }
}

/// Shared catalog: many readers, one writer, full-snapshot swap.
///
/// Readers clone the current `Arc` and release the lock immediately, so a
/// reload never blocks behind a slow search and a search never sees half a
/// catalog.
pub struct CatalogCache {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(CatalogSnapshot::default())),
        }
    }

    /// Install a new catalog and return its version.
    ///
    /// The snapshot is built before the write lock is taken.
    pub fn replace(&self, courses: Vec<Course>) -> u64 {
        let count = courses.len();
        let mut next = CatalogSnapshot::build(0, courses);

        let mut current = self.current.write().expect("catalog lock poisoned");
        next.version = current.version + 1;
        let version = next.version;
        *current = Arc::new(next);
        drop(current);

        info!(version, courses = count, "catalog loaded");
        version
    }

    /// The current snapshot. Holding it keeps that generation alive even if
    /// the cache is replaced meanwhile.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&self.current.read().expect("catalog lock poisoned"))
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<CourseSummary> {
        let snapshot = self.snapshot();
        let hits: Vec<CourseSummary> = snapshot
            .search(query, limit)
            .into_iter()
            .map(CourseSummary::from)
            .collect();
        debug!(query, hits = hits.len(), version = snapshot.version(), "catalog search");
        hits
    }

    pub fn get(&self, course_id: &str) -> Option<Course> {
        self.snapshot().get(course_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version()
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}
