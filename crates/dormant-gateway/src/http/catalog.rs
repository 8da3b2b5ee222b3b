//! Catalog lookups backing the course picker.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use dormant_catalog::CourseSummary;
use dormant_core::course::Section;
use serde::Deserialize;

use super::error::ApiError;
use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SectionsParams {
    pub course_id: Option<String>,
}

/// GET /api/search?q=, served from the in-memory catalog.
///
/// Queries shorter than `catalog.min_query_len` characters return `[]`.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<CourseSummary>> {
    let query = params.q.trim();
    if query.chars().count() < state.config.catalog.min_query_len {
        return Json(Vec::new());
    }
    Json(state.catalog.search(query, state.config.catalog.search_limit))
}

/// GET /api/sections?course_id=: all sections of one course.
pub async fn sections_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SectionsParams>,
) -> Result<Json<Vec<Section>>, ApiError> {
    let course_id = params
        .course_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("course_id is required"))?;

    if state.catalog.get(course_id).is_none() {
        return Err(ApiError::not_found(format!("unknown course: {course_id}")));
    }
    Ok(Json(state.courses.sections_for_course(course_id)?))
}
