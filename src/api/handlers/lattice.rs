use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};

use crate::api::{auth::ensure_authorized, state::AppState, types::LatticeAction};
use crate::oracles::lattice::{build_report, classify, LatticeReport};
use crate::oracles::LatticeAdjustment;

use super::error_response;

fn adjustment_for(action: LatticeAction) -> Option<LatticeAdjustment> {
    match action {
        LatticeAction::Monitor => None,
        LatticeAction::Tune { target_hz } => Some(LatticeAdjustment::Tune { target_hz }),
        LatticeAction::Cleanse => Some(LatticeAdjustment::Cleanse),
        LatticeAction::Harmonize => Some(LatticeAdjustment::Harmonize),
        LatticeAction::Shield => Some(LatticeAdjustment::Shield),
        LatticeAction::AmplifyCarrier => Some(LatticeAdjustment::AmplifyCarrier),
        LatticeAction::PurifyField => Some(LatticeAdjustment::PurifyField),
    }
}

/// POST /api/lattice
///
/// Monitor reads the lattice as-is; every other verb adjusts the source
/// first. All verbs return the same full report so callers can observe the
/// effect of an adjustment immediately.
pub async fn lattice_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(action): Json<LatticeAction>,
) -> std::result::Result<Json<LatticeReport>, (StatusCode, String)> {
    ensure_authorized(&headers, &state.api_token).map_err(error_response)?;

    let provider = state.controller.oracles().lattice_provider();
    let reading = match adjustment_for(action) {
        None => provider.read().await.map_err(error_response)?,
        Some(adjustment) => provider.adjust(adjustment).await.map_err(error_response)?,
    };

    let history = provider.history().await;
    Ok(Json(build_report(classify(reading), history)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_never_adjusts() {
        assert!(adjustment_for(LatticeAction::Monitor).is_none());
    }

    #[test]
    fn test_tune_maps_target_through() {
        match adjustment_for(LatticeAction::Tune { target_hz: 432.0 }) {
            Some(LatticeAdjustment::Tune { target_hz }) => assert_eq!(target_hz, 432.0),
            other => panic!("unexpected adjustment: {other:?}"),
        }
    }
}
