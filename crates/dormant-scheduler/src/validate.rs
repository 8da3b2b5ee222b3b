//! Input validation for generation requests and repository data.
//!
//! Request checks reject bad client input before the repository is touched.
//! Bucket checks catch malformed section data coming back from the store:
//! - Day outside 0–6
//! - Time outside 0–1439
//! - Meetings with `start >= end`
//! - Duplicate section IDs inside one bucket
//! - Sections filed under the wrong course

use std::collections::HashSet;

use dormant_core::course::{Meeting, LAST_MINUTE};

use crate::error::{Result, SchedulerError};
use crate::types::CourseBucket;

/// Validation result.
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Day-of-week outside 0–6.
    InvalidDay,
    /// Start or end minute outside the day.
    TimeOutOfRange,
    /// A meeting that does not start before it ends.
    EmptyInterval,
    /// Two sections in one bucket share an ID.
    DuplicateSection,
    /// A section whose course does not match its bucket.
    ForeignSection,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Check the requested course list and return it trimmed, in request order.
///
/// Errors on an empty list, more than `max_courses` entries, blank IDs or
/// repeated IDs.
pub fn validate_course_ids(course_ids: &[String], max_courses: usize) -> Result<Vec<String>> {
    if course_ids.is_empty() {
        return Err(SchedulerError::NoCourses);
    }
    if course_ids.len() > max_courses {
        return Err(SchedulerError::TooManyCourses {
            requested: course_ids.len(),
            max: max_courses,
        });
    }

    let mut seen = HashSet::with_capacity(course_ids.len());
    let mut cleaned = Vec::with_capacity(course_ids.len());
    for raw in course_ids {
        let id = raw.trim();
        if id.is_empty() {
            return Err(SchedulerError::InvalidCourseId(raw.clone()));
        }
        if !seen.insert(id) {
            return Err(SchedulerError::DuplicateCourse(id.to_string()));
        }
        cleaned.push(id.to_string());
    }
    Ok(cleaned)
}

/// Check a single meeting against the weekly-time invariants.
pub fn validate_meeting(meeting: &Meeting) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if meeting.day > 6 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDay,
            format!("day {} is outside 0-6", meeting.day),
        ));
    }
    if meeting.start_time > LAST_MINUTE || meeting.end_time > LAST_MINUTE {
        errors.push(ValidationError::new(
            ValidationErrorKind::TimeOutOfRange,
            format!(
                "times {}-{} exceed minute {}",
                meeting.start_time, meeting.end_time, LAST_MINUTE
            ),
        ));
    }
    if meeting.start_time >= meeting.end_time {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyInterval,
            format!(
                "meeting starts at {} but ends at {}",
                meeting.start_time, meeting.end_time
            ),
        ));
    }
    errors
}

/// Validates every section in every bucket.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_buckets(buckets: &[CourseBucket]) -> ValidationResult {
    let mut errors = Vec::new();

    for bucket in buckets {
        let mut ids = HashSet::new();
        for section in &bucket.sections {
            if !ids.insert(section.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateSection,
                    format!("section {} listed twice for {}", section.id, bucket.course_id),
                ));
            }
            if section.course_id != bucket.course_id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ForeignSection,
                    format!(
                        "section {} belongs to {}, not {}",
                        section.id, section.course_id, bucket.course_id
                    ),
                ));
            }
            for meeting in &section.meetings {
                errors.extend(validate_meeting(meeting).into_iter().map(|mut e| {
                    e.message = format!("section {}: {}", section.id, e.message);
                    e
                }));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
