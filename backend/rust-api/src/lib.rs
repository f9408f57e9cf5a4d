use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/candidates", candidate_routes())
        .nest("/api/v1/hr", hr_routes())
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn candidate_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{id}/assessment", get(handlers::assessment::get_progress))
        .route(
            "/{id}/assessment/levels/{level}",
            get(handlers::assessment::get_level_questions),
        )
        .route(
            "/{id}/assessment/levels/{level}/submit",
            post(handlers::assessment::submit_level),
        )
}

fn hr_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/{id}/plan",
            get(handlers::hr::get_plan).post(handlers::hr::apply_plan),
        )
        .route(
            "/{id}/candidates/{candidate_id}/view",
            post(handlers::hr::view_candidate),
        )
}
