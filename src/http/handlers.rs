use super::state::AppState;
use crate::backup::BackupOutcome;
use crate::session::{
    FeedbackStage, Recording, SessionOpError, SessionRunner, SessionStatus, SessionView,
    SynthesisStage, TranscriptionStage,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Optional anonymized participant id (if not provided, generate one)
    pub participant_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub participant_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRecordingRequest {
    /// Base64-encoded audio bytes from the capture widget
    pub audio: String,
    /// Container/codec tag ("wav", "webm")
    pub format: String,
    /// Capture duration in seconds
    pub duration_secs: f64,
}

#[derive(Debug, Serialize)]
pub struct SubmitRecordingResponse {
    pub attempt: u8,
    pub view: SessionView,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub status: SessionStatus,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub status: SessionStatus,
    pub backup: BackupOutcome,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

fn op_error_response(err: SessionOpError) -> axum::response::Response {
    let status = match &err {
        SessionOpError::InvalidState { .. } => StatusCode::CONFLICT,
        SessionOpError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionOpError::TranscriptionFailed(_) => StatusCode::BAD_GATEWAY,
        SessionOpError::Halted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SessionOpError::Backup(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Start a new assessment session (one live session per process)
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    let participant_id = req
        .participant_id
        .unwrap_or_else(|| format!("participant-{}", uuid::Uuid::new_v4()));

    let mut slot = state.runner.lock().await;

    if let Some(existing) = slot.as_ref() {
        if !existing.state().is_terminal() {
            return error_response(
                StatusCode::CONFLICT,
                format!("session {} is still in progress", existing.session_id()),
            );
        }
    }

    let runner = SessionRunner::new(
        participant_id.clone(),
        state.question.clone(),
        TranscriptionStage::new(state.client.clone(), state.limits.clone()),
        FeedbackStage::new(state.client.clone()),
        SynthesisStage::new(state.client.clone()),
    );
    let session_id = runner.session_id().to_string();
    *slot = Some(runner);

    info!("session {} started for {}", session_id, participant_id);

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id,
            participant_id,
            status: "awaiting_first_recording".to_string(),
        }),
    )
        .into_response()
}

/// POST /sessions/:session_id/recordings
/// Submit a recording for the current attempt slot and run its stages
pub async fn submit_recording(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitRecordingRequest>,
) -> impl IntoResponse {
    let audio = match base64::engine::general_purpose::STANDARD.decode(&req.audio) {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid audio encoding: {}", e))
        }
    };

    let recording = Recording {
        bytes: audio,
        format: req.format,
        duration: Duration::from_secs_f64(req.duration_secs.max(0.0)),
    };

    let mut slot = state.runner.lock().await;
    let runner = match session_runner(&mut slot, &session_id) {
        Ok(runner) => runner,
        Err(response) => return response,
    };

    match runner.submit_recording(recording).await {
        Ok(index) => (
            StatusCode::OK,
            Json(SubmitRecordingResponse {
                attempt: index.number(),
                view: runner.current_view(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("submit_recording failed: {}", err);
            op_error_response(err)
        }
    }
}

/// POST /sessions/:session_id/advance
/// Move past a finished attempt
pub async fn advance_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let mut slot = state.runner.lock().await;
    let runner = match session_runner(&mut slot, &session_id) {
        Ok(runner) => runner,
        Err(response) => return response,
    };

    let status = runner.advance();
    (StatusCode::OK, Json(AdvanceResponse { status })).into_response()
}

/// GET /sessions/:session_id
/// Renderable snapshot of the session
pub async fn get_session_view(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let mut slot = state.runner.lock().await;
    let runner = match session_runner(&mut slot, &session_id) {
        Ok(runner) => runner,
        Err(response) => return response,
    };

    (StatusCode::OK, Json(runner.current_view())).into_response()
}

/// GET /sessions/:session_id/comparison
/// Attempt-1 vs attempt-2 comparison for the document renderer
pub async fn get_comparison(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let mut slot = state.runner.lock().await;
    let runner = match session_runner(&mut slot, &session_id) {
        Ok(runner) => runner,
        Err(response) => return response,
    };

    match runner.comparison() {
        Some(comparison) => (StatusCode::OK, Json(comparison.clone())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "comparison not available until both attempts are transcribed".to_string(),
        ),
    }
}

/// POST /sessions/:session_id/complete
/// Finalize a completed session: build the bundle and dispatch backup
pub async fn complete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let mut slot = state.runner.lock().await;
    let runner = match session_runner(&mut slot, &session_id) {
        Ok(runner) => runner,
        Err(response) => return response,
    };

    match runner.finalize(&state.dispatcher).await {
        Ok(outcome) => {
            let status = runner.current_view().status;
            (
                StatusCode::OK,
                Json(CompleteResponse {
                    status,
                    backup: outcome,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("complete_session failed: {}", err);
            op_error_response(err)
        }
    }
}

/// POST /sessions/:session_id/abandon
/// Abandon the session; completed attempt data is retained in-process
pub async fn abandon_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let mut slot = state.runner.lock().await;
    let runner = match session_runner(&mut slot, &session_id) {
        Ok(runner) => runner,
        Err(response) => return response,
    };

    let status = runner.abandon();
    (StatusCode::OK, Json(AdvanceResponse { status })).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Resolve the active runner for a path session id, or produce the 404.
fn session_runner<'a>(
    slot: &'a mut Option<SessionRunner>,
    session_id: &str,
) -> Result<&'a mut SessionRunner, axum::response::Response> {
    match slot.as_mut() {
        Some(runner) if runner.session_id() == session_id => Ok(runner),
        _ => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("session {} not found", session_id),
        )),
    }
}
