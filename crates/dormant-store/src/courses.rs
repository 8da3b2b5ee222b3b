use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dormant_core::course::{Course, Meeting, Section};
use dormant_scheduler::{RepositoryError, SectionRepository};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::import::{CatalogImport, ImportSummary};

const SECTION_COLUMNS: &str = "id, course_id, label, instructor, location, meetings";

/// Courses and their sections.
///
/// Sections come back ordered by insertion position, then id, so the same
/// catalog always feeds the search in the same order.
pub struct CourseStore {
    db: Mutex<Connection>,
}

impl CourseStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Insert or update a course by id.
    #[instrument(skip(self, course), fields(course_id = %course.id))]
    pub fn save_course(&self, course: &Course) -> Result<()> {
        let db = self.db.lock().unwrap();
        upsert_course(&db, course)?;
        debug!("course saved");
        Ok(())
    }

    /// Insert or update a section. The owning course must already exist.
    ///
    /// A new section is appended after the course's existing ones; an
    /// update keeps its original position.
    #[instrument(skip(self, section), fields(section_id = %section.id, course_id = %section.course_id))]
    pub fn save_section(&self, section: &Section) -> Result<()> {
        let db = self.db.lock().unwrap();
        upsert_section(&db, section)?;
        debug!("section saved");
        Ok(())
    }

    /// Load a whole catalog document in one transaction.
    ///
    /// Courses are written first, so sections may reference any course in
    /// the same document. Any failure rolls the import back.
    #[instrument(skip(self, import), fields(courses = import.courses.len(), sections = import.sections.len()))]
    pub fn import(&self, import: &CatalogImport) -> Result<ImportSummary> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        for course in &import.courses {
            upsert_course(&tx, course)?;
        }
        for section in &import.sections {
            upsert_section(&tx, section)?;
        }
        tx.commit()?;
        Ok(ImportSummary {
            courses: import.courses.len(),
            sections: import.sections.len(),
        })
    }

    pub fn get_course(&self, course_id: &str) -> Result<Option<Course>> {
        let db = self.db.lock().unwrap();
        let course = db
            .query_row(
                "SELECT id, department, code, title, description, credits
                 FROM courses WHERE id = ?1",
                params![course_id],
                row_to_course,
            )
            .optional()?;
        Ok(course)
    }

    /// Every course, ordered by id. Feeds the catalog cache.
    pub fn list_courses(&self) -> Result<Vec<Course>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, department, code, title, description, credits
             FROM courses ORDER BY id",
        )?;
        let courses = stmt
            .query_map([], row_to_course)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(courses)
    }

    pub fn sections_for_course(&self, course_id: &str) -> Result<Vec<Section>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections
             WHERE course_id = ?1
             ORDER BY position, id"
        ))?;
        let sections = stmt
            .query_map(params![course_id], row_to_section)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sections)
    }

    /// Sections for several courses in a single query.
    ///
    /// Every requested id gets an entry, empty when the course has no
    /// sections or does not exist.
    #[instrument(skip(self, course_ids), fields(courses = course_ids.len()))]
    pub fn sections_for_courses(&self, course_ids: &[String]) -> Result<HashMap<String, Vec<Section>>> {
        let mut by_course: HashMap<String, Vec<Section>> = course_ids
            .iter()
            .map(|id| (id.clone(), Vec::new()))
            .collect();
        if course_ids.is_empty() {
            return Ok(by_course);
        }

        let placeholders = vec!["?"; course_ids.len()].join(", ");
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT {SECTION_COLUMNS} FROM sections
             WHERE course_id IN ({placeholders})
             ORDER BY course_id, position, id"
        ))?;
        let rows = stmt.query_map(params_from_iter(course_ids), row_to_section)?;

        let mut total = 0usize;
        for row in rows {
            let section = row?;
            total += 1;
            if let Some(bucket) = by_course.get_mut(&section.course_id) {
                bucket.push(section);
            }
        }
        debug!(sections = total, "sections loaded");
        Ok(by_course)
    }
}

#[async_trait]
impl SectionRepository for CourseStore {
    async fn fetch_sections_for_courses(
        &self,
        course_ids: &[String],
    ) -> std::result::Result<HashMap<String, Vec<Section>>, RepositoryError> {
        Ok(self.sections_for_courses(course_ids)?)
    }
}

fn upsert_course(conn: &Connection, course: &Course) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO courses (id, department, code, title, description, credits, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            department = excluded.department,
            code = excluded.code,
            title = excluded.title,
            description = excluded.description,
            credits = excluded.credits,
            updated_at = excluded.updated_at",
        params![
            course.id,
            course.department,
            course.code,
            course.title,
            course.description,
            course.credits,
            now,
        ],
    )?;
    Ok(())
}

fn upsert_section(conn: &Connection, section: &Section) -> Result<()> {
    let known: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM courses WHERE id = ?1)",
        params![section.course_id],
        |row| row.get(0),
    )?;
    if !known {
        return Err(StoreError::UnknownCourse {
            course_id: section.course_id.clone(),
        });
    }

    let meetings = serde_json::to_string(&section.meetings)?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO sections (id, course_id, label, instructor, location, meetings, position, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6,
                 (SELECT COALESCE(MAX(position) + 1, 0) FROM sections WHERE course_id = ?2),
                 ?7)
         ON CONFLICT(id) DO UPDATE SET
            course_id = excluded.course_id,
            label = excluded.label,
            instructor = excluded.instructor,
            location = excluded.location,
            meetings = excluded.meetings,
            updated_at = excluded.updated_at",
        params![
            section.id,
            section.course_id,
            section.label,
            section.instructor,
            section.location,
            meetings,
            now,
        ],
    )?;
    Ok(())
}

fn row_to_course(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        department: row.get(1)?,
        code: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        credits: row.get(5)?,
    })
}

fn row_to_section(row: &rusqlite::Row<'_>) -> rusqlite::Result<Section> {
    let raw: String = row.get(5)?;
    let meetings: Vec<Meeting> = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(Section {
        id: row.get(0)?,
        course_id: row.get(1)?,
        label: row.get(2)?,
        instructor: row.get(3)?,
        location: row.get(4)?,
        meetings,
    })
}
