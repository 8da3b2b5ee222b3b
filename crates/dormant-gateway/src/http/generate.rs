//! POST /api/generate: every conflict-free schedule for a set of courses.
//!
//! Request:  `{"course_ids": ["CS110", "MATH113"]}`
//! Response: `{"schedules": [...], "truncated": false, "stats": {...}, "elapsed_ms": 3}`
//!
//! An empty `schedules` list means the courses cannot be combined.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, Json};
use dormant_scheduler::Generation;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::{auth::authenticate, error::ApiError};
use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub course_ids: Vec<String>,
}

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Generation>, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    // Dropped with the handler future when the client goes away, which
    // stops the search.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let generation = state
        .generator
        .generate(&req.course_ids, &user_id, &cancel)
        .await?;
    Ok(Json(generation))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use dormant_core::config::DormantConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::app::{build_router, test_support};

    fn post(token: Option<&str>, body: Value) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("content-type", "application/json");
        if let Some(t) = token {
            req = req.header("authorization", format!("Bearer {t}"));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn generates_compatible_pairs() {
        let state = test_support::state();
        let token = test_support::token(&state);
        let resp = build_router(state)
            .oneshot(post(Some(&token), json!({"course_ids": ["CS100", "MATH100"]})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        let picks: Vec<Vec<String>> = json["schedules"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| {
                s["sections"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|sec| sec["id"].as_str().unwrap().to_string())
                    .collect()
            })
            .collect();
        assert_eq!(picks, vec![vec!["A", "D"], vec!["B", "D"]]);
        assert_eq!(json["truncated"], false);
        assert_eq!(json["schedules"][0]["user_id"], "u-1");
    }

    #[tokio::test]
    async fn requires_session() {
        let resp = build_router(test_support::state())
            .oneshot(post(None, json!({"course_ids": ["CS100"]})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn too_many_courses_is_bad_request() {
        let state = test_support::state();
        let token = test_support::token(&state);
        let ids: Vec<String> = (0..8).map(|i| format!("C{i}")).collect();
        let resp = build_router(state)
            .oneshot(post(Some(&token), json!({ "course_ids": ids })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "TOO_MANY_COURSES");
    }

    #[tokio::test]
    async fn unknown_course_yields_empty_list() {
        let state = test_support::state();
        let token = test_support::token(&state);
        let resp = build_router(state)
            .oneshot(post(Some(&token), json!({"course_ids": ["CS100", "ART999"]})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["schedules"], json!([]));
    }

    #[tokio::test]
    async fn exhausted_budget_is_gateway_timeout() {
        let mut config = DormantConfig::default();
        config.scheduler.search_timeout_ms = 0;
        let state = test_support::state_with(config);
        let token = test_support::token(&state);
        let resp = build_router(state)
            .oneshot(post(Some(&token), json!({"course_ids": ["CS100", "MATH100"]})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
