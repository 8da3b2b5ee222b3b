use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use dormant_catalog::CatalogCache;
use dormant_core::config::DormantConfig;
use dormant_scheduler::ScheduleGenerator;
use dormant_store::{CourseStore, ScheduleStore};
use dormant_users::{SessionManager, UserDirectory};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::http;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: DormantConfig,
    pub generator: ScheduleGenerator,
    pub catalog: CatalogCache,
    pub courses: Arc<CourseStore>,
    pub schedules: Arc<ScheduleStore>,
    pub users: UserDirectory,
    pub sessions: SessionManager,
}

impl AppState {
    /// Wire the generator to the course store (section source) and the
    /// schedule store (hand-off sink).
    pub fn new(
        config: DormantConfig,
        catalog: CatalogCache,
        courses: CourseStore,
        schedules: ScheduleStore,
        users: UserDirectory,
        sessions: SessionManager,
    ) -> Self {
        let courses = Arc::new(courses);
        let schedules = Arc::new(schedules);
        let generator = ScheduleGenerator::new(courses.clone(), config.scheduler.clone())
            .with_persistence(schedules.clone());
        Self {
            config,
            generator,
            catalog,
            courses,
            schedules,
            users,
            sessions,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = state.config.gateway.frontend_url.as_deref().and_then(cors_layer);

    let router = Router::new()
        .route("/health", get(http::health::health_handler))
        .route("/api/generate", post(http::generate::generate_handler))
        .route("/api/search", get(http::catalog::search_handler))
        .route("/api/sections", get(http::catalog::sections_handler))
        .route("/api/user/schedule", post(http::schedules::save_handler))
        .route("/api/user/schedules", get(http::schedules::list_handler))
        .route("/api/user/schedules/{id}", delete(http::schedules::delete_handler))
        .route("/api/user/generated", get(http::schedules::generated_handler))
        .route("/auth/profile", get(http::auth::profile_handler))
        .route("/auth/signout", post(http::auth::signout_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// CORS for the single configured frontend origin, with credentials.
fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(origin.trim_end_matches('/')) {
        Ok(v) => v,
        Err(e) => {
            warn!(origin, error = %e, "invalid frontend_url; CORS disabled");
            return None;
        }
    };
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use dormant_core::course::{Course, Meeting, Section};
    use dormant_store::CatalogImport;
    use dormant_users::User;
    use rusqlite::Connection;

    use super::*;

    fn memory_db(init: impl Fn(&Connection)) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init(&conn);
        conn
    }

    /// Users and sessions live in one database, so both connections share
    /// a named in-memory database.
    fn shared_users_db() -> (Connection, Connection) {
        let uri = format!("file:users-{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
        let first = Connection::open(&uri).unwrap();
        dormant_users::db::init_db(&first).unwrap();
        let second = Connection::open(&uri).unwrap();
        (first, second)
    }

    pub fn state_with(config: DormantConfig) -> Arc<AppState> {
        let courses = CourseStore::new(memory_db(|c| dormant_store::init_db(c).unwrap()));
        courses
            .import(&CatalogImport {
                courses: vec![
                    Course::new("CS100", "Intro to Computing").with_credits(3),
                    Course::new("MATH100", "Precalculus").with_credits(3),
                ],
                sections: vec![
                    Section::new("A", "CS100").with_meeting(Meeting::new(1, 540, 590)),
                    Section::new("B", "CS100").with_meeting(Meeting::new(1, 600, 650)),
                    Section::new("C", "MATH100").with_meeting(Meeting::new(1, 570, 620)),
                    Section::new("D", "MATH100").with_meeting(Meeting::new(2, 540, 590)),
                ],
            })
            .unwrap();

        let catalog = CatalogCache::new();
        catalog.replace(courses.list_courses().unwrap());

        let schedules = ScheduleStore::new(memory_db(|c| dormant_store::init_db(c).unwrap()));
        let (users_conn, sessions_conn) = shared_users_db();
        let users = UserDirectory::new(users_conn);
        users
            .upsert_user(&User::new("u-1").with_name("Ada").with_email("ada@example.edu"))
            .unwrap();

        Arc::new(AppState::new(
            config,
            catalog,
            courses,
            schedules,
            users,
            SessionManager::new(sessions_conn),
        ))
    }

    pub fn state() -> Arc<AppState> {
        state_with(DormantConfig::default())
    }

    /// A valid bearer token for user `u-1`.
    pub fn token(state: &AppState) -> String {
        state
            .sessions
            .issue(&"u-1".into(), chrono::Duration::hours(1))
            .unwrap()
            .token
    }
}
