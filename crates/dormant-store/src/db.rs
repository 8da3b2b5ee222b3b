use rusqlite::{Connection, Result};

/// Create catalog and schedule tables. Idempotent; run on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_courses_table(conn)?;
    create_sections_table(conn)?;
    create_schedules_table(conn)?;
    Ok(())
}

fn create_courses_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS courses (
            id          TEXT PRIMARY KEY,
            department  TEXT NOT NULL DEFAULT '',
            code        TEXT NOT NULL DEFAULT '',
            title       TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            credits     INTEGER NOT NULL DEFAULT 0,
            updated_at  TEXT NOT NULL
        );",
    )
}

/// Meetings are stored as a JSON array. `position` fixes the order sections
/// are handed to the search, which keeps generation output stable.
fn create_sections_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sections (
            id          TEXT PRIMARY KEY,
            course_id   TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            label       TEXT NOT NULL DEFAULT '',
            instructor  TEXT NOT NULL DEFAULT '',
            location    TEXT NOT NULL DEFAULT '',
            meetings    TEXT NOT NULL DEFAULT '[]',
            position    INTEGER NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sections_course
            ON sections(course_id, position, id);",
    )
}

/// One row per schedule; `sections` is a full JSON snapshot so later catalog
/// edits never rewrite a user's saved plan.
fn create_schedules_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schedules (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            name        TEXT NOT NULL,
            origin      TEXT NOT NULL DEFAULT 'saved',
            sections    TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_schedules_user
            ON schedules(user_id, origin, created_at);",
    )
}
