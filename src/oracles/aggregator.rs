//! Gating oracle aggregator.
//!
//! Pure arithmetic over the three classified oracle snapshots. Identical
//! inputs always yield identical outputs; every agent and hive in a step
//! evaluates against the single snapshot produced here.

use serde::{Deserialize, Serialize};

use crate::domain::{
    GateSnapshot, LatticeMode, LatticeSnapshot, PlanetaryCondition, PlanetarySnapshot,
    Recommendation, StargateSnapshot,
};

use super::lattice;

/// Weight of planetary power in the combined score.
const PLANETARY_WEIGHT: f64 = 0.4;
/// Weight of lattice power in the combined score.
const LATTICE_WEIGHT: f64 = 0.6;

/// Combine the three oracle snapshots into one gate decision for a step.
pub fn aggregate(
    stargate: StargateSnapshot,
    planetary: PlanetarySnapshot,
    lattice: LatticeSnapshot,
) -> GateSnapshot {
    let planetary_power = planetary.cosmic_coherence * planetary.condition.derate();
    let lattice_power = lattice.reading.field_purity * lattice.lattice_mode.derate();
    let combined_power = PLANETARY_WEIGHT * planetary_power + LATTICE_WEIGHT * lattice_power;

    let recommendation = if combined_power >= 1.0
        && planetary.condition != PlanetaryCondition::Extreme
        && lattice.lattice_mode != LatticeMode::Distortion
    {
        Recommendation::Aggressive
    } else if combined_power >= 0.7 {
        Recommendation::Normal
    } else if combined_power >= 0.5 || planetary.condition == PlanetaryCondition::Stormy {
        Recommendation::Cautious
    } else {
        Recommendation::Defensive
    };

    let trading_multiplier = recommendation.factor() * stargate.multiplier;

    GateSnapshot {
        stargate,
        planetary,
        lattice,
        planetary_power,
        lattice_power,
        combined_power,
        recommendation,
        trading_multiplier,
    }
}

/// Five-level overall system posture on the cosmic dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemState {
    Transcendent,
    Optimal,
    Balanced,
    Cautious,
    Defensive,
}

impl SystemState {
    fn from_index(index: f64) -> Self {
        if index >= 0.85 {
            SystemState::Transcendent
        } else if index >= 0.7 {
            SystemState::Optimal
        } else if index >= 0.5 {
            SystemState::Balanced
        } else if index >= 0.35 {
            SystemState::Cautious
        } else {
            SystemState::Defensive
        }
    }
}

/// Unified snapshot of all three oracles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmicDashboard {
    pub stargate: StargateSnapshot,
    pub planetary: PlanetarySnapshot,
    pub lattice: LatticeSnapshot,
    pub combined_power: f64,
    pub recommendation: Recommendation,
    pub trading_multiplier: f64,
    pub unified_power_index: f64,
    pub system_state: SystemState,
}

/// Merge a gate snapshot into the weighted dashboard view.
///
/// Sub-scores are all in [0, 1] (combined power is clamped) and the weights
/// sum to 1.0, so the unified index stays in [0, 1].
pub fn cosmic_dashboard(gate: GateSnapshot) -> CosmicDashboard {
    let protection = lattice::protection_level(&gate.lattice.reading);
    let unified_power_index = 0.25 * gate.stargate.alignment_score.clamp(0.0, 1.0)
        + 0.35 * gate.combined_power.clamp(0.0, 1.0)
        + 0.2 * gate.lattice.reading.field_purity.clamp(0.0, 1.0)
        + 0.2 * protection;

    CosmicDashboard {
        system_state: SystemState::from_index(unified_power_index),
        unified_power_index,
        combined_power: gate.combined_power,
        recommendation: gate.recommendation,
        trading_multiplier: gate.trading_multiplier,
        stargate: gate.stargate,
        planetary: gate.planetary,
        lattice: gate.lattice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LatticeReading, PlanetaryReading, StargateReading};
    use crate::oracles::{lattice, planetary, stargate};

    fn strong_stargate() -> StargateSnapshot {
        stargate::classify(StargateReading {
            network_strength: 0.97,
            avg_coherence: 0.92,
            grid_energy: 0.85,
            active_nodes: 256,
        })
    }

    fn neutral_planetary() -> PlanetarySnapshot {
        planetary::classify(planetary::neutral_reading())
    }

    fn neutral_lattice() -> LatticeSnapshot {
        lattice::classify(lattice::neutral_reading())
    }

    #[test]
    fn test_strong_network_with_neutral_surroundings() {
        let gate = aggregate(strong_stargate(), neutral_planetary(), neutral_lattice());
        assert!(gate.stargate.is_open);
        assert_eq!(gate.recommendation, Recommendation::Normal);
        assert_eq!(gate.trading_multiplier, 2.0);
    }

    #[test]
    fn test_aggregation_is_pure() {
        let a = aggregate(strong_stargate(), neutral_planetary(), neutral_lattice());
        let b = aggregate(strong_stargate(), neutral_planetary(), neutral_lattice());
        assert_eq!(a.combined_power, b.combined_power);
        assert_eq!(a.recommendation, b.recommendation);
        assert_eq!(a.trading_multiplier, b.trading_multiplier);
    }

    #[test]
    fn test_extreme_conditions_block_aggressive() {
        let stormy = planetary::classify(PlanetaryReading {
            activity_index: 8.5,
            wind_speed: 750.0,
            ..planetary::neutral_reading()
        });
        let pristine = lattice::classify(LatticeReading {
            dominant_hz: lattice::CARRIER_HZ,
            carrier_strength: 1.0,
            distortion_level: 0.0,
            field_purity: 1.0,
        });
        let gate = aggregate(strong_stargate(), stormy, pristine);
        // lattice alone pushes combined power past 1.0 but EXTREME vetoes
        assert!(gate.combined_power < 1.0 || gate.recommendation != Recommendation::Aggressive);
        assert_ne!(gate.recommendation, Recommendation::Aggressive);
    }

    #[test]
    fn test_pristine_lattice_goes_aggressive() {
        let calm = planetary::classify(PlanetaryReading {
            activity_index: 1.0,
            wind_speed: 310.0,
            ..planetary::neutral_reading()
        });
        let pristine = lattice::classify(LatticeReading {
            dominant_hz: lattice::CARRIER_HZ,
            carrier_strength: 1.0,
            distortion_level: 0.0,
            field_purity: 1.0,
        });
        let gate = aggregate(strong_stargate(), calm, pristine);
        assert!(gate.combined_power >= 1.0);
        assert_eq!(gate.recommendation, Recommendation::Aggressive);
        assert_eq!(gate.trading_multiplier, 1.5 * 2.0);
    }

    #[test]
    fn test_distortion_forces_derate() {
        let distorted = lattice::classify(LatticeReading {
            dominant_hz: lattice::CARRIER_HZ,
            carrier_strength: 0.9,
            distortion_level: 0.9,
            field_purity: 0.9,
        });
        let gate = aggregate(strong_stargate(), neutral_planetary(), distorted);
        assert_ne!(gate.recommendation, Recommendation::Aggressive);
        assert!(!gate.permits_trading());
    }

    #[test]
    fn test_unified_power_index_bounded() {
        // worst case
        let sealed = stargate::classify(StargateReading {
            network_strength: 0.0,
            avg_coherence: 0.0,
            grid_energy: 0.0,
            active_nodes: 0,
        });
        let extreme = planetary::classify(PlanetaryReading {
            activity_index: 9.0,
            wind_speed: 900.0,
            field_bz: -20.0,
            ..planetary::neutral_reading()
        });
        let dead = lattice::classify(LatticeReading {
            dominant_hz: 0.0,
            carrier_strength: 0.0,
            distortion_level: 1.0,
            field_purity: 0.0,
        });
        let low = cosmic_dashboard(aggregate(sealed, extreme, dead));
        assert!((0.0..=1.0).contains(&low.unified_power_index));
        assert_eq!(low.system_state, SystemState::Defensive);

        // best case
        let open = strong_stargate();
        let calm = planetary::classify(PlanetaryReading {
            activity_index: 0.0,
            wind_speed: 300.0,
            ..planetary::neutral_reading()
        });
        let pristine = lattice::classify(LatticeReading {
            dominant_hz: lattice::CARRIER_HZ,
            carrier_strength: 1.0,
            distortion_level: 0.0,
            field_purity: 1.0,
        });
        let high = cosmic_dashboard(aggregate(open, calm, pristine));
        assert!((0.0..=1.0).contains(&high.unified_power_index));
        assert!(high.unified_power_index > low.unified_power_index);
    }
}
