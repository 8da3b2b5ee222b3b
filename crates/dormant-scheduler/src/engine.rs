use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dormant_core::config::SchedulerConfig;
use dormant_core::course::{Schedule, Section};
use dormant_core::types::UserId;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    assemble::assemble,
    error::{Result, SchedulerError},
    repository::{SchedulePersistence, SectionRepository},
    search::search,
    types::{CourseBucket, Generation, SearchAbort, SearchLimits},
    validate::{validate_buckets, validate_course_ids},
};

/// Request orchestrator: validate, fetch, search, assemble.
///
/// Holds no per-request state, so one instance is shared by every request
/// (wrap it in an `Arc`). The backtracking search runs on the blocking pool
/// so a large request never stalls the async executor.
pub struct ScheduleGenerator {
    repository: Arc<dyn SectionRepository>,
    /// If set, generated schedules are handed off here after each request.
    persistence: Option<Arc<dyn SchedulePersistence>>,
    config: SchedulerConfig,
}

impl ScheduleGenerator {
    pub fn new(repository: Arc<dyn SectionRepository>, config: SchedulerConfig) -> Self {
        Self {
            repository,
            persistence: None,
            config,
        }
    }

    /// Hand every successful generation to `persistence` (fire-and-forget).
    pub fn with_persistence(mut self, persistence: Arc<dyn SchedulePersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Generate every conflict-free schedule for `course_ids`, up to the
    /// configured emission cap.
    ///
    /// Input errors are returned before the repository is called. A course
    /// with no sections yields `Ok` with zero schedules. `cancel` is honoured
    /// while waiting on the repository and inside the search loop; partial
    /// results are never returned. `search_timeout_ms` bounds the fetch and
    /// the search together.
    #[instrument(skip_all, fields(user_id = %user_id, courses = course_ids.len()))]
    pub async fn generate(
        &self,
        course_ids: &[String],
        user_id: &UserId,
        cancel: &CancellationToken,
    ) -> Result<Generation> {
        let started = Instant::now();
        let course_ids = validate_course_ids(course_ids, self.config.max_courses)?;
        let deadline = started + Duration::from_millis(self.config.search_timeout_ms);

        // The budget runs from request start, so a slow fetch eats into it.
        let fetch = tokio::time::timeout_at(
            deadline.into(),
            self.repository.fetch_sections_for_courses(&course_ids),
        );
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SchedulerError::Cancelled),
            res = fetch => match res {
                Ok(res) => res?,
                Err(_) => {
                    warn!(budget_ms = self.config.search_timeout_ms, "section fetch exceeded the time budget");
                    return Err(self.timeout());
                }
            },
        };

        let buckets = into_buckets(&course_ids, fetched)?;
        if let Err(errors) = validate_buckets(&buckets) {
            let summary = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            warn!(count = errors.len(), "repository returned invalid sections");
            return Err(SchedulerError::InvalidSectionData(summary));
        }

        let limits = SearchLimits::new(self.config.max_results.max(1)).with_deadline(deadline);
        let search_cancel = cancel.clone();

        let (buckets, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = search(&buckets, &limits, &search_cancel);
            (buckets, outcome)
        })
        .await
        .map_err(|e| SchedulerError::Internal(format!("search task failed: {e}")))?;

        let outcome = outcome.map_err(|abort| match abort {
            SearchAbort::Cancelled => SchedulerError::Cancelled,
            SearchAbort::DeadlineExceeded => self.timeout(),
        })?;

        let schedules = assemble(&buckets, &outcome.combinations, user_id);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if outcome.truncated {
            warn!(
                cap = self.config.max_results,
                nodes = outcome.stats.nodes_visited,
                "emission cap reached; result truncated"
            );
        }
        info!(
            schedules = schedules.len(),
            truncated = outcome.truncated,
            nodes = outcome.stats.nodes_visited,
            search_space = outcome.stats.search_space,
            elapsed_ms,
            "schedules generated"
        );

        self.hand_off(user_id, &schedules);

        Ok(Generation {
            schedules,
            truncated: outcome.truncated,
            stats: outcome.stats,
            elapsed_ms,
        })
    }

    fn timeout(&self) -> SchedulerError {
        SchedulerError::Timeout {
            ms: self.config.search_timeout_ms,
        }
    }

    /// Spawn the persistence write without awaiting it.
    ///
    /// An empty generation is handed off too: it clears the user's previous set.
    fn hand_off(&self, user_id: &UserId, schedules: &[Schedule]) {
        let Some(ref persistence) = self.persistence else {
            return;
        };
        if !self.config.persist_generated {
            return;
        }

        let persistence = Arc::clone(persistence);
        let user_id = user_id.clone();
        let schedules = schedules.to_vec();
        tokio::spawn(async move {
            match persistence.save_generated(&user_id, &schedules).await {
                Ok(()) => debug!(user_id = %user_id, count = schedules.len(), "generated schedules persisted"),
                Err(e) => warn!(user_id = %user_id, error = %e, "failed to persist generated schedules"),
            }
        });
    }
}

/// Order the repository result by request, failing on any omitted course.
///
/// Entries for courses that were not requested are ignored.
fn into_buckets(
    course_ids: &[String],
    mut fetched: HashMap<String, Vec<Section>>,
) -> Result<Vec<CourseBucket>> {
    let mut buckets = Vec::with_capacity(course_ids.len());
    for id in course_ids {
        let sections = fetched
            .remove(id)
            .ok_or_else(|| SchedulerError::MissingCourse {
                course_id: id.clone(),
            })?;
        buckets.push(CourseBucket::new(id.clone(), sections));
    }
    if !fetched.is_empty() {
        debug!(extra = fetched.len(), "ignoring sections for courses not requested");
    }
    Ok(buckets)
}
