//! Request and response types for the HTTP API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::OrderSide;

// ==================== Session surface ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub owner: String,
    pub initial_capital: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionActionRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

// ==================== Control surface ====================

/// Every verb accepted by POST /api/control. One request carries exactly one
/// action; unknown actions fail deserialization and map to 400.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    EmergencyHalt,
    EmergencyResume,
    #[serde(rename_all = "camelCase")]
    OverrideCosmicGates { enabled: bool },
    #[serde(rename_all = "camelCase")]
    BypassValidation { enabled: bool },
    #[serde(rename_all = "camelCase")]
    SetTradingMultiplier { multiplier: Decimal },
    GetAuthority,
    ResetAuthority,
    #[serde(rename_all = "camelCase")]
    DirectTrade {
        symbol: String,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        #[serde(default)]
        bypass: bool,
    },
    #[serde(rename_all = "camelCase")]
    SpawnHive {
        #[serde(default)]
        parent_hive_id: Option<Uuid>,
        #[serde(default)]
        session_id: Option<Uuid>,
        initial_balance: Decimal,
        num_agents: i32,
    },
    #[serde(rename_all = "camelCase")]
    BoostHive { hive_id: Uuid, amount: Decimal },
    #[serde(rename_all = "camelCase")]
    TerminateHive { hive_id: Uuid },
    ClearQueue,
    #[serde(rename_all = "camelCase")]
    PrioritizeOrder { order_id: String, priority: i32 },
    ForceProcessQueue,
}

impl ControlAction {
    /// Stable name written to the audit log.
    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::EmergencyHalt => "emergency_halt",
            ControlAction::EmergencyResume => "emergency_resume",
            ControlAction::OverrideCosmicGates { .. } => "override_cosmic_gates",
            ControlAction::BypassValidation { .. } => "bypass_validation",
            ControlAction::SetTradingMultiplier { .. } => "set_trading_multiplier",
            ControlAction::GetAuthority => "get_authority",
            ControlAction::ResetAuthority => "reset_authority",
            ControlAction::DirectTrade { .. } => "direct_trade",
            ControlAction::SpawnHive { .. } => "spawn_hive",
            ControlAction::BoostHive { .. } => "boost_hive",
            ControlAction::TerminateHive { .. } => "terminate_hive",
            ControlAction::ClearQueue => "clear_queue",
            ControlAction::PrioritizeOrder { .. } => "prioritize_order",
            ControlAction::ForceProcessQueue => "force_process_queue",
        }
    }

    /// Read-only actions are not written to the audit log.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, ControlAction::GetAuthority)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlResponse {
    pub action: &'static str,
    pub result: serde_json::Value,
}

// ==================== Lattice surface ====================

/// Verbs accepted by POST /api/lattice. Monitor only reads; the rest adjust
/// the lattice source first. All return the same full report.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LatticeAction {
    Monitor,
    #[serde(rename_all = "camelCase")]
    Tune { target_hz: f64 },
    Cleanse,
    Harmonize,
    Shield,
    AmplifyCarrier,
    PurifyField,
}

// ==================== Health ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
    pub uptime_secs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_action_deserializes_by_tag() {
        let action: ControlAction =
            serde_json::from_str(r#"{"action":"emergency_halt"}"#).unwrap();
        assert_eq!(action.name(), "emergency_halt");

        let action: ControlAction = serde_json::from_str(
            r#"{"action":"set_trading_multiplier","multiplier":"2.5"}"#,
        )
        .unwrap();
        assert!(matches!(
            action,
            ControlAction::SetTradingMultiplier { .. }
        ));

        assert!(serde_json::from_str::<ControlAction>(r#"{"action":"self_destruct"}"#).is_err());
    }

    #[test]
    fn test_direct_trade_bypass_defaults_off() {
        let action: ControlAction = serde_json::from_str(
            r#"{"action":"direct_trade","symbol":"BTC-USD","side":"BUY","quantity":"0.1","price":"64000"}"#,
        )
        .unwrap();
        match action {
            ControlAction::DirectTrade { bypass, side, .. } => {
                assert!(!bypass);
                assert_eq!(side, OrderSide::Buy);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_lattice_tune_carries_target() {
        let action: LatticeAction =
            serde_json::from_str(r#"{"action":"tune","targetHz":432.0}"#).unwrap();
        assert!(matches!(action, LatticeAction::Tune { target_hz } if target_hz == 432.0));
    }

    #[test]
    fn test_get_authority_is_not_a_mutation() {
        assert!(!ControlAction::GetAuthority.is_mutation());
        assert!(ControlAction::EmergencyHalt.is_mutation());
    }
}
