use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Agent configuration
        .route(
            "/interviews/agent-description",
            post(handlers::agent_description),
        )
        // Call lifecycle
        .route("/calls/start", post(handlers::start_call))
        .route("/calls/:call_id/stop", post(handlers::stop_call))
        .route("/calls/:call_id/status", get(handlers::call_status))
        // In-call signals
        .route("/calls/:call_id/focus-lost", post(handlers::focus_lost))
        .route("/calls/:call_id/unload", post(handlers::unload))
        // Post-call
        .route("/calls/:call_id/feedback", post(handlers::submit_feedback))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
