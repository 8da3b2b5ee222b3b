//! Saved schedules of the logged-in user ("plan A", "plan B", ...) and the
//! last generated set.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dormant_core::course::{Schedule, Section};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{auth::authenticate, error::ApiError};
use crate::app::AppState;

/// Body of POST /api/user/schedule. A missing `id` creates a new schedule;
/// an existing one is overwritten.
#[derive(Debug, Deserialize)]
pub struct SaveScheduleRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// POST /api/user/schedule
pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SaveScheduleRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let name = match req.name.trim() {
        "" => "Untitled schedule".to_string(),
        n => n.to_string(),
    };
    let saved = state.schedules.save_user_schedule(
        &user_id,
        Schedule {
            id: req.id,
            user_id: user_id.to_string(),
            name,
            sections: req.sections,
        },
    )?;
    info!(user_id = %user_id, schedule_id = %saved.id, "schedule saved");
    Ok(Json(json!({ "status": "saved", "id": saved.id })))
}

/// GET /api/user/schedules
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Schedule>>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    Ok(Json(state.schedules.list_user_schedules(&user_id)?))
}

/// GET /api/user/generated
///
/// The last generation handed off for this user; empty when persistence of
/// generated schedules is disabled.
pub async fn generated_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Schedule>>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    Ok(Json(state.schedules.list_generated(&user_id)?))
}

/// DELETE /api/user/schedules/{id}
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    state.schedules.delete_user_schedule(&user_id, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
