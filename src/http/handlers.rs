use super::state::AppState;
use crate::agent::{build_agent_description, AgentDescription};
use crate::error::{RegistrationError, StartError};
use crate::notice::{Notice, NoticeLevel};
use crate::session::{CallSession, InterviewConfig, Respondent, SessionController};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCallRequest {
    pub interview: InterviewConfig,
    pub respondent: Option<Respondent>,
}

#[derive(Debug, Serialize)]
pub struct StartCallResponse {
    pub call_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AgentDescriptionRequest {
    pub sessions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FocusLostResponse {
    pub tab_switch_count: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn start_error_response(e: &StartError) -> axum::response::Response {
    let status = match e {
        StartError::PermissionDenied | StartError::Ineligible(_) => StatusCode::FORBIDDEN,
        StartError::Registration(RegistrationError::QuotaExhausted) => {
            StatusCode::PAYMENT_REQUIRED
        }
        StartError::Registration(_)
        | StartError::Transport(_)
        | StartError::EligibilityCheck(_) => StatusCode::BAD_GATEWAY,
        StartError::CallInProgress => StatusCode::CONFLICT,
    };
    error_response(status, e.to_string())
}

/// Drain a call's notices into the log. The channel is the non-blocking
/// notification surface; the server's rendition of it is structured logging.
fn drain_notices(call_id: String, mut notices: mpsc::UnboundedReceiver<Notice>) {
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            match notice.level {
                NoticeLevel::Error => warn!("[call {}] {}", call_id, notice.message),
                _ => info!("[call {}] {}", call_id, notice.message),
            }
        }
    });
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /calls/start
/// Run the full gated start sequence and return the live call id.
pub async fn start_call(
    State(state): State<AppState>,
    Json(req): Json<StartCallRequest>,
) -> impl IntoResponse {
    info!(
        "Start requested for interview {}",
        req.interview.interview_id
    );

    let transport = state.deps.transport_factory.new_client();
    let (controller, notice_rx) = SessionController::new(
        req.interview,
        transport,
        Arc::clone(&state.deps.registrar),
        Arc::clone(&state.deps.store),
        Arc::clone(&state.deps.permissions),
    );
    let controller = Arc::new(controller);

    controller.request_consent().await;
    match controller.start(req.respondent).await {
        Ok(call_id) => {
            drain_notices(call_id.clone(), notice_rx);
            state.insert_call(call_id.clone(), controller).await;
            (
                StatusCode::OK,
                Json(StartCallResponse {
                    call_id,
                    status: "calling".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Call start failed: {}", e);
            start_error_response(&e)
        }
    }
}

/// POST /calls/:call_id/stop
/// Participant-initiated end; returns once the call has reached `ended`.
pub async fn stop_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    let controller = {
        let calls = state.calls.read().await;
        calls.get(&call_id).cloned()
    };

    match controller {
        Some(controller) => {
            controller.end().await;
            let snapshot: CallSession = controller.snapshot().await;
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Call {call_id} not found")),
    }
}

/// GET /calls/:call_id/status
pub async fn call_status(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    let calls = state.calls.read().await;

    match calls.get(&call_id) {
        Some(controller) => {
            let snapshot = controller.snapshot().await;
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Call {call_id} not found")),
    }
}

/// POST /calls/:call_id/focus-lost
/// The interview page lost focus; bump the per-call counter.
pub async fn focus_lost(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    let calls = state.calls.read().await;

    match calls.get(&call_id) {
        Some(controller) => {
            let tab_switch_count = controller.focus_lost().await;
            (StatusCode::OK, Json(FocusLostResponse { tab_switch_count })).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Call {call_id} not found")),
    }
}

/// POST /calls/:call_id/unload
/// The interview page is being torn down mid-call.
pub async fn unload(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> impl IntoResponse {
    let controller = {
        let calls = state.calls.read().await;
        calls.get(&call_id).cloned()
    };

    match controller {
        Some(controller) => {
            controller.unload().await;
            StatusCode::NO_CONTENT.into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Call {call_id} not found")),
    }
}

/// POST /calls/:call_id/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    Json(req): Json<FeedbackRequest>,
) -> impl IntoResponse {
    let controller = {
        let calls = state.calls.read().await;
        calls.get(&call_id).cloned()
    };

    match controller {
        Some(controller) => match controller.submit_feedback(req.rating, req.comment).await {
            Ok(()) => StatusCode::NO_CONTENT.into_response(),
            Err(e) => {
                error!("Failed to store feedback for {}: {}", call_id, e);
                error_response(StatusCode::BAD_GATEWAY, "Failed to store feedback")
            }
        },
        None => error_response(StatusCode::NOT_FOUND, format!("Call {call_id} not found")),
    }
}

/// POST /interviews/agent-description
/// Build the fixed-shape engine description for a deep-dive interview.
pub async fn agent_description(
    Json(req): Json<AgentDescriptionRequest>,
) -> Result<Json<AgentDescription>, axum::response::Response> {
    build_agent_description(&req.sessions)
        .map(Json)
        .map_err(|e| error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
