mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::catalog::Catalog;
use crate::db::Database;
use crate::executor::Executor;
use crate::grader::Grader;

pub use middleware::{RateLimiter, SecurityConfig};

/// Source of "today" for streak and shield rules.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub catalog: Arc<Catalog>,
    pub grader: Grader,
    clock: Clock,
}

impl AppState {
    pub fn new(db: Database, catalog: Arc<Catalog>, executor: Arc<dyn Executor>) -> Self {
        let grader = Grader::new(db.clone(), catalog.clone(), executor);
        Self {
            db,
            catalog,
            grader,
            clock: Arc::new(|| chrono::Local::now().date_naive()),
        }
    }

    /// Replace the clock, e.g. to pin dates in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }
}

pub fn create_router(state: AppState, security: SecurityConfig) -> Router {
    let mut api = Router::new()
        // Catalog
        .route("/skills", get(handlers::list_skills))
        .route("/skills/{skill}/roadmap", get(handlers::get_roadmap))
        // Users
        .route("/users", post(handlers::create_user))
        .route("/users/{username}", get(handlers::get_user))
        .route("/users/{username}/skill", post(handlers::select_skill))
        .route("/users/{username}/dashboard", get(handlers::get_dashboard))
        // Grading
        .route("/users/{username}/submissions", post(handlers::submit))
        // Shields
        .route("/users/{username}/shield/activate", post(handlers::activate_shield))
        .route("/users/{username}/shield/resume", post(handlers::resume_shield))
        // Mentors
        .route("/users/{username}/mentors/{skill}", get(handlers::list_mentors))
        .route("/users/{username}/mentorship", get(handlers::list_mentorship_requests))
        .route("/users/{username}/mentorship/{mentor}", post(handlers::request_mentorship))
        // Leaderboard
        .route("/leaderboard/{skill}", get(handlers::get_leaderboard));

    if let Some(limiter) = security.rate_limiter.clone() {
        api = api.layer(from_fn_with_state(limiter, middleware::rate_limit_middleware));
    }
    let api = api.layer(from_fn_with_state(
        security.clone(),
        middleware::auth_middleware,
    ));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(api);

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&security)),
        )
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    match &security.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
