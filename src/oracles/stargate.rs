//! Stargate (network alignment) oracle.
//!
//! Classifies a raw network reading into one of four gate states. The gate
//! multiplier scales every agent's trade chance for the step, and a SEALED
//! gate closes trading entirely (barring discretionary overrides).

use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use std::sync::Mutex;

use crate::domain::{GateState, StargateReading, StargateSnapshot};
use crate::error::Result;

/// Opaque provider for stargate readings
#[async_trait]
pub trait StargateProvider: Send + Sync {
    async fn read(&self) -> Result<StargateReading>;
}

/// Neutral baseline substituted when the provider fails or times out.
/// Classifies as ALIGNED so degradation derates rather than halts.
pub fn neutral_reading() -> StargateReading {
    StargateReading {
        network_strength: 0.75,
        avg_coherence: 0.75,
        grid_energy: 0.75,
        active_nodes: 144,
    }
}

/// Classify a raw reading into a gate snapshot.
pub fn classify(reading: StargateReading) -> StargateSnapshot {
    let alignment_score = 0.5 * reading.network_strength
        + 0.3 * reading.avg_coherence
        + 0.2 * reading.grid_energy;

    let gate_status = if alignment_score >= 0.9 {
        GateState::FullyOpen
    } else if alignment_score >= 0.75 {
        GateState::Aligned
    } else if alignment_score >= 0.5 {
        GateState::Opening
    } else {
        GateState::Sealed
    };

    StargateSnapshot {
        multiplier: gate_status.multiplier(),
        is_open: gate_status.is_open(),
        alignment_score,
        gate_status,
        reading,
    }
}

/// Simulated stargate source: a slowly drifting network strength with
/// per-read jitter. Stands in for the external grid monitor.
pub struct SimulatedStargate {
    state: Mutex<SimState>,
}

struct SimState {
    rng: rand::rngs::StdRng,
    strength: f64,
}

impl SimulatedStargate {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        };
        Self {
            state: Mutex::new(SimState { rng, strength: 0.8 }),
        }
    }
}

#[async_trait]
impl StargateProvider for SimulatedStargate {
    async fn read(&self) -> Result<StargateReading> {
        let mut state = self.state.lock().expect("stargate sim lock poisoned");
        let drift: f64 = state.rng.gen_range(-0.05..0.05);
        state.strength = (state.strength + drift).clamp(0.2, 1.0);
        let strength = state.strength;
        let coherence = (strength + state.rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
        let grid_energy = state.rng.gen_range(0.4..1.0);
        let active_nodes = state.rng.gen_range(72..288);
        Ok(StargateReading {
            network_strength: strength,
            avg_coherence: coherence,
            grid_energy,
            active_nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_network_fully_opens_gate() {
        let snapshot = classify(StargateReading {
            network_strength: 0.97,
            avg_coherence: 0.92,
            grid_energy: 0.85,
            active_nodes: 256,
        });
        assert_eq!(snapshot.gate_status, GateState::FullyOpen);
        assert_eq!(snapshot.multiplier, 2.0);
        assert!(snapshot.is_open);
    }

    #[test]
    fn test_weak_network_seals_gate() {
        let snapshot = classify(StargateReading {
            network_strength: 0.3,
            avg_coherence: 0.4,
            grid_energy: 0.2,
            active_nodes: 12,
        });
        assert_eq!(snapshot.gate_status, GateState::Sealed);
        assert!(!snapshot.is_open);
        assert_eq!(snapshot.multiplier, 0.3);
    }

    #[test]
    fn test_neutral_baseline_is_aligned() {
        let snapshot = classify(neutral_reading());
        assert_eq!(snapshot.gate_status, GateState::Aligned);
    }

    #[tokio::test]
    async fn test_simulated_reads_stay_in_range() {
        let sim = SimulatedStargate::new(Some(7));
        for _ in 0..50 {
            let reading = sim.read().await.unwrap();
            assert!((0.0..=1.0).contains(&reading.network_strength));
            assert!((0.0..=1.0).contains(&reading.avg_coherence));
        }
    }
}
