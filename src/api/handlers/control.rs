//! Supreme control surface: one endpoint, a closed catalogue of verbs.
//!
//! Every mutating action lands in the audit log with the caller's token
//! fingerprint. Audit writes are best effort; a logging failure never fails
//! the action that already took effect.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::api::{auth::ensure_authorized, state::AppState, types::*};

use super::error_response;

/// POST /api/control
pub async fn control_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(action): Json<ControlAction>,
) -> std::result::Result<Json<ControlResponse>, (StatusCode, String)> {
    let fingerprint = ensure_authorized(&headers, &state.api_token).map_err(error_response)?;

    let result = execute(&state, &action).await.map_err(error_response)?;

    if action.is_mutation() {
        if let Err(e) = state
            .controller
            .store()
            .record_control_action(
                action.name(),
                &format!("control action {} executed", action.name()),
                Some(&fingerprint),
                &result,
            )
            .await
        {
            warn!(action = action.name(), error = %e, "audit log write failed");
        }
    }

    Ok(Json(ControlResponse {
        action: action.name(),
        result,
    }))
}

async fn execute(state: &AppState, action: &ControlAction) -> crate::error::Result<Value> {
    let controller = &state.controller;
    let authority = controller.authority();

    match action {
        ControlAction::EmergencyHalt => {
            let paused = authority.emergency_halt().await?;
            Ok(json!({ "halted": true, "sessionsPaused": paused }))
        }
        ControlAction::EmergencyResume => {
            let resumed = authority.emergency_resume().await?;
            Ok(json!({ "halted": false, "sessionsResumed": resumed }))
        }
        ControlAction::OverrideCosmicGates { enabled } => {
            authority.set_override_gates(*enabled).await?;
            Ok(json!({ "overrideCosmicGates": enabled }))
        }
        ControlAction::BypassValidation { enabled } => {
            authority.set_bypass_validation(*enabled).await?;
            Ok(json!({ "bypassValidation": enabled }))
        }
        ControlAction::SetTradingMultiplier { multiplier } => {
            authority.set_forced_multiplier(*multiplier).await?;
            Ok(json!({ "forcedMultiplier": multiplier }))
        }
        ControlAction::GetAuthority => {
            let current = authority.state().await?;
            Ok(serde_json::to_value(current)?)
        }
        ControlAction::ResetAuthority => {
            let current = authority.reset().await?;
            Ok(serde_json::to_value(current)?)
        }
        ControlAction::DirectTrade {
            symbol,
            side,
            quantity,
            price,
            bypass,
        } => {
            let result = controller
                .direct_trade(symbol, *side, *quantity, *price, *bypass)
                .await?;
            Ok(serde_json::to_value(result)?)
        }
        ControlAction::SpawnHive {
            parent_hive_id,
            session_id,
            initial_balance,
            num_agents,
        } => {
            let hive = controller
                .manual_spawn(*parent_hive_id, *session_id, *initial_balance, *num_agents)
                .await?;
            Ok(serde_json::to_value(hive)?)
        }
        ControlAction::BoostHive { hive_id, amount } => {
            controller.boost_hive(*hive_id, *amount).await?;
            Ok(json!({ "hiveId": hive_id, "boosted": amount }))
        }
        ControlAction::TerminateHive { hive_id } => {
            controller.terminate_hive(*hive_id).await?;
            Ok(json!({ "hiveId": hive_id, "terminated": true }))
        }
        ControlAction::ClearQueue => {
            let cleared = controller.queue().clear().await?;
            Ok(json!({ "cleared": cleared }))
        }
        ControlAction::PrioritizeOrder { order_id, priority } => {
            controller.queue().prioritize(order_id, *priority).await?;
            Ok(json!({ "orderId": order_id, "priority": priority }))
        }
        ControlAction::ForceProcessQueue => {
            let processed = controller.queue().force_process().await?;
            Ok(json!({ "processed": processed }))
        }
    }
}
