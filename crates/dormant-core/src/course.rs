//! Catalog reference data and generated schedules.
//!
//! Field names on the wire follow the registrar export: a section's label is
//! serialised as `section` and its instructor as `professor`, and meetings use
//! `start_time` / `end_time` in minutes from midnight.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Last valid minute of a day (23:59).
pub const LAST_MINUTE: u16 = 1439;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A catalog course, e.g. `CS110 Principles of Computing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Department + number, e.g. `"CS110"`.
    pub id: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub credits: u32,
}

impl Course {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            department: String::new(),
            code: String::new(),
            title: title.into(),
            description: String::new(),
            credits: 0,
        }
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }
}

/// One recurring weekly time block of a section.
///
/// `day` is 0 = Sunday … 6 = Saturday. Times are minutes from midnight and
/// describe the half-open interval `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub day: u8,
    pub start_time: u16,
    pub end_time: u16,
    #[serde(default)]
    pub location: String,
}

impl Meeting {
    pub fn new(day: u8, start_time: u16, end_time: u16) -> Self {
        Self {
            day,
            start_time,
            end_time,
            location: String::new(),
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Short weekday name, or `"?"` for an out-of-range day.
    pub fn day_name(&self) -> &'static str {
        DAY_NAMES.get(self.day as usize).copied().unwrap_or("?")
    }
}

impl fmt::Display for Meeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}-{:02}:{:02}",
            self.day_name(),
            self.start_time / 60,
            self.start_time % 60,
            self.end_time / 60,
            self.end_time % 60
        )
    }
}

/// One offering of a course, identified by its registrar CRN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub course_id: String,
    #[serde(rename = "section", alias = "label", default)]
    pub label: String,
    #[serde(rename = "professor", alias = "instructor", default)]
    pub instructor: String,
    /// Display location; individual meetings may override it.
    #[serde(default)]
    pub location: String,
    /// Async sections have no meetings.
    #[serde(default)]
    pub meetings: Vec<Meeting>,
}

impl Section {
    pub fn new(id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            course_id: course_id.into(),
            label: String::new(),
            instructor: String::new(),
            location: String::new(),
            meetings: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = instructor.into();
        self
    }

    pub fn with_meeting(mut self, meeting: Meeting) -> Self {
        self.meetings.push(meeting);
        self
    }

    pub fn is_async(&self) -> bool {
        self.meetings.is_empty()
    }
}

/// A conflict-free selection of one section per requested course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub user_id: String,
    /// Human-facing label, e.g. `"Plan A"` or `"Schedule 3"`.
    pub name: String,
    /// In requested-course order.
    pub sections: Vec<Section>,
}

impl Schedule {
    pub fn section_ids(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn total_weekly_minutes(&self) -> u32 {
        self.sections
            .iter()
            .flat_map(|s| &s.meetings)
            .map(|m| m.duration_minutes() as u32)
            .sum()
    }
}
