//! Planetary (environmental) oracle.
//!
//! Derives a single `cosmic_coherence` score from a resonance-frequency
//! reading plus geomagnetic-style activity inputs, and classifies the overall
//! condition. EXTREME conditions veto trading regardless of other signals.

use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use std::sync::Mutex;

use crate::domain::{PlanetaryCondition, PlanetaryReading, PlanetarySnapshot};
use crate::error::Result;

/// Baseline resonance frequency in Hz.
pub const BASELINE_RESONANCE_HZ: f64 = 7.83;

/// Opaque provider for planetary readings
#[async_trait]
pub trait PlanetaryProvider: Send + Sync {
    async fn read(&self) -> Result<PlanetaryReading>;
}

/// Neutral baseline substituted when the provider fails or times out.
pub fn neutral_reading() -> PlanetaryReading {
    PlanetaryReading {
        resonance_hz: BASELINE_RESONANCE_HZ,
        activity_index: 3.0,
        wind_speed: 400.0,
        field_bz: 0.0,
        cycle_phase: 0.5,
        torque_factor: 1.0,
    }
}

fn nearness(value: f64, baseline: f64) -> f64 {
    (1.0 - (value - baseline).abs() / baseline).max(0.0)
}

/// Classify a raw reading into a planetary snapshot.
///
/// Coherence is the product of four normalized sub-factors: quieter activity,
/// calmer wind, non-southward field, and frequency near baseline all score
/// higher.
pub fn classify(reading: PlanetaryReading) -> PlanetarySnapshot {
    let activity_factor = (1.0 - reading.activity_index / 10.0).clamp(0.0, 1.0);
    let wind_factor = (1.0 - (reading.wind_speed - 300.0) / 500.0).clamp(0.0, 1.0);
    let field_factor = if reading.field_bz >= 0.0 {
        1.0
    } else {
        (1.0 + reading.field_bz / 20.0).max(0.2)
    };
    let frequency_factor = nearness(reading.resonance_hz, BASELINE_RESONANCE_HZ);

    let cosmic_coherence =
        (activity_factor * wind_factor * field_factor * frequency_factor).clamp(0.0, 1.0);

    let condition = if reading.activity_index >= 8.0 || reading.wind_speed >= 700.0 {
        PlanetaryCondition::Extreme
    } else if reading.activity_index >= 6.0 || reading.wind_speed >= 600.0 {
        PlanetaryCondition::Stormy
    } else if reading.activity_index >= 4.0 || reading.wind_speed >= 500.0 {
        PlanetaryCondition::Active
    } else {
        PlanetaryCondition::Calm
    };

    PlanetarySnapshot {
        cosmic_coherence,
        condition,
        reading,
    }
}

/// Simulated planetary source with drifting activity.
pub struct SimulatedPlanetary {
    state: Mutex<SimState>,
}

struct SimState {
    rng: rand::rngs::StdRng,
    activity: f64,
}

impl SimulatedPlanetary {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        };
        Self {
            state: Mutex::new(SimState { rng, activity: 3.0 }),
        }
    }
}

#[async_trait]
impl PlanetaryProvider for SimulatedPlanetary {
    async fn read(&self) -> Result<PlanetaryReading> {
        let mut state = self.state.lock().expect("planetary sim lock poisoned");
        let drift: f64 = state.rng.gen_range(-0.8..0.8);
        state.activity = (state.activity + drift).clamp(0.0, 9.0);
        let activity = state.activity;
        Ok(PlanetaryReading {
            resonance_hz: BASELINE_RESONANCE_HZ + state.rng.gen_range(-1.5..1.5),
            activity_index: activity,
            wind_speed: state.rng.gen_range(300.0..750.0),
            field_bz: state.rng.gen_range(-15.0..10.0),
            cycle_phase: state.rng.gen_range(0.0..1.0),
            torque_factor: state.rng.gen_range(0.8..1.2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading_with(activity: f64, wind: f64) -> PlanetaryReading {
        PlanetaryReading {
            resonance_hz: BASELINE_RESONANCE_HZ,
            activity_index: activity,
            wind_speed: wind,
            field_bz: 0.0,
            cycle_phase: 0.5,
            torque_factor: 1.0,
        }
    }

    #[test]
    fn test_high_activity_is_extreme() {
        assert_eq!(
            classify(reading_with(8.0, 750.0)).condition,
            PlanetaryCondition::Extreme
        );
        // either trigger alone is enough
        assert_eq!(
            classify(reading_with(8.0, 350.0)).condition,
            PlanetaryCondition::Extreme
        );
        assert_eq!(
            classify(reading_with(2.0, 720.0)).condition,
            PlanetaryCondition::Extreme
        );
    }

    #[test]
    fn test_condition_thresholds() {
        assert_eq!(
            classify(reading_with(2.0, 350.0)).condition,
            PlanetaryCondition::Calm
        );
        assert_eq!(
            classify(reading_with(4.5, 350.0)).condition,
            PlanetaryCondition::Active
        );
        assert_eq!(
            classify(reading_with(6.5, 350.0)).condition,
            PlanetaryCondition::Stormy
        );
    }

    #[test]
    fn test_coherence_rewards_quiet_conditions() {
        let quiet = classify(reading_with(1.0, 320.0)).cosmic_coherence;
        let rough = classify(reading_with(7.0, 650.0)).cosmic_coherence;
        assert!(quiet > rough);
        assert!((0.0..=1.0).contains(&quiet));
        assert!((0.0..=1.0).contains(&rough));
    }

    #[test]
    fn test_southward_field_penalized() {
        let mut northward = reading_with(2.0, 350.0);
        northward.field_bz = 5.0;
        let mut southward = reading_with(2.0, 350.0);
        southward.field_bz = -10.0;
        assert!(
            classify(northward).cosmic_coherence > classify(southward).cosmic_coherence
        );
    }
}
