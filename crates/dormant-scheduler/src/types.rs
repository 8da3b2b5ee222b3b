use std::time::Instant;

use dormant_core::course::{Schedule, Section};
use serde::Serialize;

/// Candidate sections for one requested course, in repository order.
///
/// Lives only for the duration of one generation request.
#[derive(Debug, Clone)]
pub struct CourseBucket {
    pub course_id: String,
    pub sections: Vec<Section>,
}

impl CourseBucket {
    pub fn new(course_id: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            course_id: course_id.into(),
            sections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}

/// One valid pick: `indices[i]` is the chosen position inside bucket `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combination(pub Vec<usize>);

impl Combination {
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Resolve the indices against the buckets they were produced from.
    pub fn sections<'a>(&self, buckets: &'a [CourseBucket]) -> Vec<&'a Section> {
        self.0
            .iter()
            .zip(buckets)
            .map(|(&idx, bucket)| &bucket.sections[idx])
            .collect()
    }
}

/// Bounds applied to a single backtracking search.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Emission cap. The search stops once one more valid combination is
    /// found beyond this count.
    pub max_results: usize,
    /// Wall-clock deadline; `None` means unbounded.
    pub deadline: Option<Instant>,
    /// Nodes between cancellation/deadline polls.
    pub check_interval: u64,
}

impl SearchLimits {
    pub const DEFAULT_CHECK_INTERVAL: u64 = 1024;

    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            deadline: None,
            check_interval: Self::DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_check_interval(mut self, every: u64) -> Self {
        self.check_interval = every.max(1);
        self
    }
}

/// Work counters for one search.
///
/// `search_space` is the size of the full Cartesian product (saturating);
/// `nodes_visited` counts partial assignments actually entered, including
/// the empty root, so pruning effectiveness is `nodes_visited` versus the
/// sum of prefix products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub search_space: u64,
    pub nodes_visited: u64,
    pub conflict_checks: u64,
    /// Candidates rejected because they clashed with an earlier pick.
    pub pruned: u64,
}

/// Why a search stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAbort {
    Cancelled,
    DeadlineExceeded,
}

/// Result of a completed (possibly truncated) search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// In deterministic order: lexicographic by bucket index.
    pub combinations: Vec<Combination>,
    /// More valid combinations exist beyond `combinations`.
    pub truncated: bool,
    pub stats: SearchStats,
}

/// Outcome of a generation request.
///
/// An empty `schedules` list is a valid answer: no conflict-free
/// combination exists for the requested courses.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub schedules: Vec<Schedule>,
    pub truncated: bool,
    pub stats: SearchStats,
    pub elapsed_ms: u64,
}
