use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Stargate (network alignment) gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    Sealed,
    Opening,
    Aligned,
    FullyOpen,
}

impl GateState {
    pub fn multiplier(&self) -> f64 {
        match self {
            GateState::Sealed => 0.3,
            GateState::Opening => 1.0,
            GateState::Aligned => 1.5,
            GateState::FullyOpen => 2.0,
        }
    }

    pub fn is_open(&self) -> bool {
        *self != GateState::Sealed
    }
}

/// Environmental (planetary) condition classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanetaryCondition {
    Calm,
    Active,
    Stormy,
    Extreme,
}

impl PlanetaryCondition {
    pub fn derate(&self) -> f64 {
        match self {
            PlanetaryCondition::Calm => 1.2,
            PlanetaryCondition::Active => 1.0,
            PlanetaryCondition::Stormy => 0.7,
            PlanetaryCondition::Extreme => 0.4,
        }
    }
}

/// Resonance lattice operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LatticeMode {
    Distortion,
    Nullifying,
    CarrierActive,
    GaiaResonance,
}

impl LatticeMode {
    pub fn derate(&self) -> f64 {
        match self {
            LatticeMode::GaiaResonance => 1.5,
            LatticeMode::CarrierActive => 1.2,
            LatticeMode::Nullifying => 0.9,
            LatticeMode::Distortion => 0.5,
        }
    }
}

/// Trading posture derived from combined oracle power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Aggressive,
    Normal,
    Cautious,
    Defensive,
}

impl Recommendation {
    /// Trade-chance factor for this posture.
    pub fn factor(&self) -> f64 {
        match self {
            Recommendation::Aggressive => 1.5,
            Recommendation::Normal => 1.0,
            Recommendation::Cautious => 0.6,
            Recommendation::Defensive => 0.3,
        }
    }

    /// Position-size factor for this posture.
    pub fn risk_factor(&self) -> f64 {
        match self {
            Recommendation::Aggressive => 1.5,
            Recommendation::Normal => 1.0,
            Recommendation::Cautious => 0.5,
            Recommendation::Defensive => 0.25,
        }
    }
}

/// Raw reading from the stargate (network alignment) oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StargateReading {
    pub network_strength: f64,
    pub avg_coherence: f64,
    pub grid_energy: f64,
    pub active_nodes: u32,
}

/// Classified stargate snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StargateSnapshot {
    #[serde(flatten)]
    pub reading: StargateReading,
    pub alignment_score: f64,
    pub gate_status: GateState,
    pub multiplier: f64,
    pub is_open: bool,
}

/// Raw reading from the planetary (environmental) oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetaryReading {
    /// Resonance frequency in Hz, baseline 7.83.
    pub resonance_hz: f64,
    /// Geomagnetic-style activity index, 0-9.
    pub activity_index: f64,
    /// Solar-wind-like magnitude, km/s scale.
    pub wind_speed: f64,
    /// Directional field component; southward (negative) is unfavorable.
    pub field_bz: f64,
    /// Cyclical phase in [0, 1].
    pub cycle_phase: f64,
    pub torque_factor: f64,
}

/// Classified planetary snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetarySnapshot {
    #[serde(flatten)]
    pub reading: PlanetaryReading,
    pub cosmic_coherence: f64,
    pub condition: PlanetaryCondition,
}

/// Raw reading from the resonance lattice oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatticeReading {
    /// Dominant frequency in Hz, carrier baseline 528.
    pub dominant_hz: f64,
    pub carrier_strength: f64,
    pub distortion_level: f64,
    pub field_purity: f64,
}

/// Classified lattice snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatticeSnapshot {
    #[serde(flatten)]
    pub reading: LatticeReading,
    pub healing_score: f64,
    pub lattice_mode: LatticeMode,
}

/// One shared gate decision per step: the three oracle snapshots plus the
/// derived permission/derate outputs. Attached as audit metadata to every
/// order submitted during the step; never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateSnapshot {
    pub stargate: StargateSnapshot,
    pub planetary: PlanetarySnapshot,
    pub lattice: LatticeSnapshot,
    pub planetary_power: f64,
    pub lattice_power: f64,
    pub combined_power: f64,
    pub recommendation: Recommendation,
    pub trading_multiplier: f64,
}

impl GateSnapshot {
    /// Whether agents may trade without a discretionary override.
    pub fn permits_trading(&self) -> bool {
        self.stargate.is_open
            && self.planetary.condition != PlanetaryCondition::Extreme
            && self.lattice.lattice_mode != LatticeMode::Distortion
    }
}

/// An order an agent wants to place this step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProposal {
    pub session_id: uuid::Uuid,
    pub hive_id: uuid::Uuid,
    pub agent_id: uuid::Uuid,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub priority: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_state_multipliers() {
        assert_eq!(GateState::Sealed.multiplier(), 0.3);
        assert_eq!(GateState::FullyOpen.multiplier(), 2.0);
        assert!(!GateState::Sealed.is_open());
        assert!(GateState::Opening.is_open());
    }

    #[test]
    fn test_side_serializes_uppercase() {
        assert_eq!(serde_json::to_value(OrderSide::Buy).unwrap(), "BUY");
        assert_eq!(
            serde_json::from_value::<OrderSide>(serde_json::json!("SELL")).unwrap(),
            OrderSide::Sell
        );
    }
}
