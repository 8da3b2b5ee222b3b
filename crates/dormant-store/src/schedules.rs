use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use dormant_core::course::{Schedule, Section};
use dormant_core::types::{ScheduleId, UserId};
use dormant_scheduler::{RepositoryError, SchedulePersistence};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{Result, StoreError};

/// Where a stored schedule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleOrigin {
    /// Saved explicitly by the user.
    Saved,
    /// Written by the generator after a request.
    Generated,
}

impl fmt::Display for ScheduleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleOrigin::Saved => write!(f, "saved"),
            ScheduleOrigin::Generated => write!(f, "generated"),
        }
    }
}

impl FromStr for ScheduleOrigin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "saved" => Ok(ScheduleOrigin::Saved),
            "generated" => Ok(ScheduleOrigin::Generated),
            other => Err(format!("unknown schedule origin: {other}")),
        }
    }
}

/// Per-user schedules. Each row is a snapshot: saving overwrites the whole
/// schedule, sections included.
pub struct ScheduleStore {
    db: Mutex<Connection>,
}

impl ScheduleStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Save (or overwrite) a schedule for `user_id`.
    ///
    /// A blank id gets a fresh one. The stored owner is always `user_id`,
    /// whatever the payload says. Overwriting another user's schedule id is
    /// refused as not found.
    #[instrument(skip(self, schedule), fields(user_id = %user_id))]
    pub fn save_user_schedule(&self, user_id: &UserId, mut schedule: Schedule) -> Result<Schedule> {
        if schedule.id.trim().is_empty() {
            schedule.id = ScheduleId::new().into_string();
        }
        schedule.user_id = user_id.to_string();

        let db = self.db.lock().unwrap();
        let owner: Option<String> = db
            .query_row(
                "SELECT user_id FROM schedules WHERE id = ?1",
                params![schedule.id],
                |row| row.get(0),
            )
            .optional()?;
        if owner.is_some_and(|o| o != schedule.user_id) {
            return Err(StoreError::ScheduleNotFound { id: schedule.id });
        }

        write_schedule(&db, &schedule, ScheduleOrigin::Saved)?;
        debug!(schedule_id = %schedule.id, "schedule saved");
        Ok(schedule)
    }

    /// A user's saved schedules, oldest first.
    pub fn list_user_schedules(&self, user_id: &UserId) -> Result<Vec<Schedule>> {
        self.list(user_id, ScheduleOrigin::Saved)
    }

    /// The most recent generation handed off for a user.
    pub fn list_generated(&self, user_id: &UserId) -> Result<Vec<Schedule>> {
        self.list(user_id, ScheduleOrigin::Generated)
    }

    /// Delete one of the user's schedules.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn delete_user_schedule(&self, user_id: &UserId, schedule_id: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        let removed = db.execute(
            "DELETE FROM schedules WHERE id = ?1 AND user_id = ?2",
            params![schedule_id, user_id.as_str()],
        )?;
        if removed == 0 {
            return Err(StoreError::ScheduleNotFound {
                id: schedule_id.to_string(),
            });
        }
        debug!(schedule_id, "schedule deleted");
        Ok(())
    }

    /// Replace the user's generated set with `schedules`, atomically.
    #[instrument(skip(self, schedules), fields(user_id = %user_id, count = schedules.len()))]
    pub fn replace_generated(&self, user_id: &UserId, schedules: &[Schedule]) -> Result<()> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;
        tx.execute(
            "DELETE FROM schedules WHERE user_id = ?1 AND origin = ?2",
            params![user_id.as_str(), ScheduleOrigin::Generated.to_string()],
        )?;
        for schedule in schedules {
            let mut owned = schedule.clone();
            owned.user_id = user_id.to_string();
            write_schedule(&tx, &owned, ScheduleOrigin::Generated)?;
        }
        tx.commit()?;
        info!("generated schedules stored");
        Ok(())
    }

    fn list(&self, user_id: &UserId, origin: ScheduleOrigin) -> Result<Vec<Schedule>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, user_id, name, sections FROM schedules
             WHERE user_id = ?1 AND origin = ?2
             ORDER BY created_at, id",
        )?;
        let schedules = stmt
            .query_map(params![user_id.as_str(), origin.to_string()], row_to_schedule)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(schedules)
    }
}

#[async_trait]
impl SchedulePersistence for ScheduleStore {
    async fn save_generated(
        &self,
        user_id: &UserId,
        schedules: &[Schedule],
    ) -> std::result::Result<(), RepositoryError> {
        Ok(self.replace_generated(user_id, schedules)?)
    }
}

/// Upsert keyed by id; `created_at` survives overwrites.
fn write_schedule(conn: &Connection, schedule: &Schedule, origin: ScheduleOrigin) -> Result<()> {
    let sections = serde_json::to_string(&schedule.sections)?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO schedules (id, user_id, name, origin, sections, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            origin = excluded.origin,
            sections = excluded.sections,
            updated_at = excluded.updated_at",
        params![
            schedule.id,
            schedule.user_id,
            schedule.name,
            origin.to_string(),
            sections,
            now,
        ],
    )?;
    Ok(())
}

fn row_to_schedule(row: &rusqlite::Row<'_>) -> rusqlite::Result<Schedule> {
    let raw: String = row.get(3)?;
    let sections: Vec<Section> = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(Schedule {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        sections,
    })
}
