//! Bearer-session authentication and the `/auth/*` endpoints.
//!
//! Sessions are minted out of band (the identity provider hand-off, or the
//! `issue-session` CLI command); this module only resolves and revokes them.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use dormant_core::types::UserId;
use dormant_users::User;
use serde_json::{json, Value};
use tracing::debug;

use super::error::ApiError;
use crate::app::AppState;

/// Resolve the caller's session to a user id, or 401.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let token = extract_bearer(headers).ok_or_else(ApiError::unauthorized)?;
    state
        .sessions
        .resolve(token)?
        .ok_or_else(ApiError::unauthorized)
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// GET /auth/profile: the logged-in user's profile.
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    Ok(Json(state.users.get_user(user_id.as_str())?))
}

/// POST /auth/signout: revoke the presented token.
pub async fn signout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    if let Some(token) = extract_bearer(&headers) {
        state.sessions.revoke(token)?;
    }
    debug!(user_id = %user_id, "signed out");
    Ok(Json(json!({ "status": "signed_out" })))
}
