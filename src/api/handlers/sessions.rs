use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::api::{auth::ensure_authorized, state::AppState, types::*};
use crate::engine::{StartOutcome, StatusOutcome, StepOutcome};

use super::error_response;

/// POST /api/session/start
pub async fn start_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StartSessionRequest>,
) -> std::result::Result<Json<StartOutcome>, (StatusCode, String)> {
    ensure_authorized(&headers, &state.api_token).map_err(error_response)?;
    state
        .controller
        .start(&req.owner, req.initial_capital)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /api/session/step
pub async fn step_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SessionActionRequest>,
) -> std::result::Result<Json<StepOutcome>, (StatusCode, String)> {
    ensure_authorized(&headers, &state.api_token).map_err(error_response)?;
    state
        .controller
        .step(req.session_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /api/session/stop
pub async fn stop_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SessionActionRequest>,
) -> std::result::Result<Json<MessageResponse>, (StatusCode, String)> {
    ensure_authorized(&headers, &state.api_token).map_err(error_response)?;
    state
        .controller
        .stop(req.session_id)
        .await
        .map(|message| Json(MessageResponse { message }))
        .map_err(error_response)
}

/// GET /api/session/:id
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<Uuid>,
) -> std::result::Result<Json<StatusOutcome>, (StatusCode, String)> {
    ensure_authorized(&headers, &state.api_token).map_err(error_response)?;
    state
        .controller
        .status(session_id)
        .await
        .map(Json)
        .map_err(error_response)
}
