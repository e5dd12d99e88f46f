//! HTTP API server for driving interview calls
//!
//! This module provides a REST API over the session runtime:
//! - POST /calls/start - Run the gated start sequence
//! - POST /calls/:id/stop - Participant-initiated end
//! - GET /calls/:id/status - Query call state
//! - POST /calls/:id/focus-lost - Report a tab focus loss
//! - POST /calls/:id/unload - Page-teardown cleanup
//! - POST /calls/:id/feedback - Post-call feedback
//! - POST /interviews/agent-description - Build the engine description
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, RuntimeDeps, ENDED_RETENTION};
