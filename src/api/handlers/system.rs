use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};

use crate::api::{auth::ensure_authorized, state::AppState, types::HealthResponse};
use crate::oracles::CosmicDashboard;

use super::error_response;

/// GET /health -- lightweight liveness/readiness probe, unauthenticated
pub async fn health_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_status = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.controller.store().pool())
        .await
    {
        Ok(_) => "connected".to_string(),
        Err(_) => "disconnected".to_string(),
    };

    let ok = db_status == "connected";
    let resp = HealthResponse {
        status: if ok {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        db: db_status,
        uptime_secs: state.uptime_seconds(),
    };

    if ok {
        Ok(Json(resp))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(resp)))
    }
}

/// GET /api/cosmic -- unified dashboard over a fresh oracle read
pub async fn cosmic_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Json<CosmicDashboard>, (StatusCode, String)> {
    ensure_authorized(&headers, &state.api_token).map_err(error_response)?;
    Ok(Json(state.controller.oracles().cosmic().await))
}
