//! Depth-first enumeration of conflict-free section combinations.
//!
//! One recursion level per course, candidates tried in bucket order, and a
//! candidate is tested against every earlier pick before descending. A branch
//! is therefore cut at the first clash instead of at full depth.
//!
//! Worst case (nothing conflicts, no cap) the search visits
//! `1 + |b0| + |b0||b1| + … + ∏|bi|` nodes, i.e. `O(∏|bi|)`. When sections
//! clash heavily the visited count collapses towards `Σ|bi|`.
//!
//! Emission order is lexicographic over the per-bucket indices. Truncation at
//! `max_results` always returns the same prefix of that order.

use std::ops::ControlFlow;
use std::time::Instant;

use dormant_core::course::Section;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::conflict::sections_conflict;
use crate::types::{Combination, CourseBucket, SearchAbort, SearchLimits, SearchOutcome, SearchStats};

/// Enumerate every conflict-free one-section-per-course combination.
///
/// Returns an empty outcome when any bucket is empty: every combination must
/// cover every course, so a course without candidates makes the whole request
/// infeasible. Cancellation and deadline expiry discard partial results.
pub fn search(
    buckets: &[CourseBucket],
    limits: &SearchLimits,
    cancel: &CancellationToken,
) -> Result<SearchOutcome, SearchAbort> {
    let stats = SearchStats {
        search_space: search_space(buckets),
        ..SearchStats::default()
    };

    if let Some(empty) = buckets.iter().find(|b| b.is_empty()) {
        debug!(course_id = %empty.course_id, "course has no sections; request infeasible");
        return Ok(SearchOutcome {
            combinations: Vec::new(),
            truncated: false,
            stats,
        });
    }

    let mut walker = Backtracker {
        buckets,
        limits,
        cancel,
        chosen: Vec::with_capacity(buckets.len()),
        results: Vec::new(),
        stats,
    };

    let truncated = match walker.descend(0) {
        ControlFlow::Continue(()) => false,
        ControlFlow::Break(Halt::CapReached) => true,
        ControlFlow::Break(Halt::Aborted(reason)) => {
            debug!(
                ?reason,
                nodes = walker.stats.nodes_visited,
                found = walker.results.len(),
                "search aborted; discarding partial results"
            );
            return Err(reason);
        }
    };

    Ok(SearchOutcome {
        combinations: walker.results,
        truncated,
        stats: walker.stats,
    })
}

/// Size of the full Cartesian product, saturating at `u64::MAX`.
pub fn search_space(buckets: &[CourseBucket]) -> u64 {
    buckets
        .iter()
        .fold(1u64, |acc, b| acc.saturating_mul(b.len() as u64))
}

enum Halt {
    CapReached,
    Aborted(SearchAbort),
}

struct Backtracker<'a> {
    buckets: &'a [CourseBucket],
    limits: &'a SearchLimits,
    cancel: &'a CancellationToken,
    /// Index into `buckets[depth].sections` for every depth decided so far.
    chosen: Vec<usize>,
    results: Vec<Combination>,
    stats: SearchStats,
}

impl<'a> Backtracker<'a> {
    fn descend(&mut self, depth: usize) -> ControlFlow<Halt> {
        self.stats.nodes_visited += 1;
        if (self.stats.nodes_visited - 1) % self.limits.check_interval.max(1) == 0 {
            self.poll_interrupt()?;
        }

        let buckets = self.buckets;
        let Some(bucket) = buckets.get(depth) else {
            return self.emit();
        };

        for (idx, candidate) in bucket.sections.iter().enumerate() {
            if self.clashes_with_chosen(candidate) {
                self.stats.pruned += 1;
                continue;
            }
            self.chosen.push(idx);
            let flow = self.descend(depth + 1);
            self.chosen.pop();
            flow?;
        }
        ControlFlow::Continue(())
    }

    fn emit(&mut self) -> ControlFlow<Halt> {
        if self.results.len() >= self.limits.max_results {
            return ControlFlow::Break(Halt::CapReached);
        }
        self.results.push(Combination(self.chosen.clone()));
        ControlFlow::Continue(())
    }

    fn clashes_with_chosen(&mut self, candidate: &Section) -> bool {
        for (depth, &idx) in self.chosen.iter().enumerate() {
            self.stats.conflict_checks += 1;
            if sections_conflict(&self.buckets[depth].sections[idx], candidate) {
                return true;
            }
        }
        false
    }

    fn poll_interrupt(&self) -> ControlFlow<Halt> {
        if self.cancel.is_cancelled() {
            return ControlFlow::Break(Halt::Aborted(SearchAbort::Cancelled));
        }
        if self.limits.deadline.is_some_and(|d| Instant::now() >= d) {
            return ControlFlow::Break(Halt::Aborted(SearchAbort::DeadlineExceeded));
        }
        ControlFlow::Continue(())
    }
}
