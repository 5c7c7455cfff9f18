use super::state::AppState;
use crate::error::ReplayError;
use crate::output::SavedReplaySummary;
use crate::replay::ReplayStatus;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: ReplayStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopResponse {
    pub looping_enabled: bool,
    pub status: ReplayStatus,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    #[serde(flatten)]
    pub replay: SavedReplaySummary,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

fn status_code_for(err: &ReplayError) -> StatusCode {
    match err {
        ReplayError::InvalidCommand { .. } => StatusCode::CONFLICT,
        ReplayError::EmptyWindow | ReplayError::EmptyArtifact => StatusCode::UNPROCESSABLE_ENTITY,
        ReplayError::CaptureUnavailable(_) | ReplayError::PermissionDenied(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: ReplayError) -> Response {
    (
        status_code_for(&err),
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
        .into_response()
}

fn command_response(state: &AppState, message: &str) -> Response {
    (
        StatusCode::OK,
        Json(CommandResponse {
            status: state.replay.status(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /replay/start
/// Acquire capture and begin the countdown
pub async fn start_replay(State(state): State<AppState>) -> impl IntoResponse {
    match state.replay.start().await {
        Ok(()) => {
            info!("Replay started");
            command_response(&state, "Countdown started")
        }
        Err(e) => {
            error!("Failed to start replay: {}", e);
            error_response(e)
        }
    }
}

/// POST /replay/pause
pub async fn pause_replay(State(state): State<AppState>) -> impl IntoResponse {
    match state.replay.pause().await {
        Ok(()) => command_response(&state, "Recording paused"),
        Err(e) => error_response(e),
    }
}

/// POST /replay/resume
pub async fn resume_replay(State(state): State<AppState>) -> impl IntoResponse {
    match state.replay.resume().await {
        Ok(()) => command_response(&state, "Recording resumed"),
        Err(e) => error_response(e),
    }
}

/// POST /replay/loop
/// Toggle looping on or off
pub async fn toggle_loop(State(state): State<AppState>) -> impl IntoResponse {
    match state.replay.toggle_loop().await {
        Ok(looping_enabled) => (
            StatusCode::OK,
            Json(LoopResponse {
                looping_enabled,
                status: state.replay.status(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /replay/save
/// Save the rolling window and write it to the recordings directory
pub async fn save_replay(State(state): State<AppState>) -> impl IntoResponse {
    let saved = match state.replay.save().await {
        Ok(saved) => saved,
        Err(e) => {
            error!("Failed to save replay: {}", e);
            return error_response(e);
        }
    };

    match state.sink.persist(&saved).await {
        Ok(path) => (
            StatusCode::OK,
            Json(SaveResponse {
                replay: SavedReplaySummary::from(&saved),
                path: path.display().to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            // The controller has already stopped; these bytes are the only copy
            error!(
                "Failed to write replay {} ({} bytes lost): {:#}",
                saved.filename,
                saved.artifact.len(),
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!(
                        "Failed to write replay {} ({} bytes): {:#}",
                        saved.filename,
                        saved.artifact.len(),
                        e
                    ),
                    code: "WRITE_FAILED".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /replay/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.replay.status()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
