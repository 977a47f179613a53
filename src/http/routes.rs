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
        // Session lifecycle
        .route("/sessions", post(handlers::start_session))
        .route(
            "/sessions/:session_id/recordings",
            post(handlers::submit_recording),
        )
        .route(
            "/sessions/:session_id/advance",
            post(handlers::advance_session),
        )
        .route(
            "/sessions/:session_id/complete",
            post(handlers::complete_session),
        )
        .route(
            "/sessions/:session_id/abandon",
            post(handlers::abandon_session),
        )
        // Session queries
        .route("/sessions/:session_id", get(handlers::get_session_view))
        .route(
            "/sessions/:session_id/comparison",
            get(handlers::get_comparison),
        )
        // The recording UI is a browser app served from its own origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
