use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Replay commands
        .route("/replay/start", post(handlers::start_replay))
        .route("/replay/pause", post(handlers::pause_replay))
        .route("/replay/resume", post(handlers::resume_replay))
        .route("/replay/loop", post(handlers::toggle_loop))
        .route("/replay/save", post(handlers::save_replay))
        // Status for the UI
        .route("/replay/status", get(handlers::get_status))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
