//! Resonance lattice oracle.
//!
//! The lattice is the only oracle with a tunable source: the lattice API
//! surface can retarget its dominant frequency, cleanse distortion, or boost
//! individual signals. Every read lands in a short rolling history used for
//! frequency-stability analysis.

use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::{LatticeMode, LatticeReading, LatticeSnapshot};
use crate::error::Result;

/// Carrier frequency in Hz the lattice locks onto when healthy.
pub const CARRIER_HZ: f64 = 528.0;

/// Rolling history depth reported by the lattice surface.
pub const HISTORY_DEPTH: usize = 10;

/// Parameter adjustments accepted by the lattice source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LatticeAdjustment {
    /// Retarget the dominant frequency
    Tune { target_hz: f64 },
    /// Halve present distortion
    Cleanse,
    /// Pull the dominant frequency toward the carrier and lift its strength
    Harmonize,
    /// Raise field purity and cap distortion
    Shield,
    /// Single-signal nudge: carrier strength
    AmplifyCarrier,
    /// Single-signal nudge: field purity
    PurifyField,
}

/// Opaque provider for lattice readings
#[async_trait]
pub trait LatticeProvider: Send + Sync {
    async fn read(&self) -> Result<LatticeReading>;

    /// Apply an adjustment to the source and return the resulting reading.
    async fn adjust(&self, adjustment: LatticeAdjustment) -> Result<LatticeReading>;

    /// Last readings, oldest first, at most [`HISTORY_DEPTH`].
    async fn history(&self) -> Vec<LatticeReading>;
}

/// Neutral baseline substituted when the provider fails or times out.
pub fn neutral_reading() -> LatticeReading {
    LatticeReading {
        dominant_hz: CARRIER_HZ,
        carrier_strength: 0.6,
        distortion_level: 0.2,
        field_purity: 0.7,
    }
}

fn nearness(value: f64, baseline: f64) -> f64 {
    (1.0 - (value - baseline).abs() / baseline).max(0.0)
}

/// Classify a raw reading into a lattice snapshot.
pub fn classify(reading: LatticeReading) -> LatticeSnapshot {
    let healing_score = (reading.carrier_strength
        * (1.0 - reading.distortion_level)
        * nearness(reading.dominant_hz, CARRIER_HZ))
    .clamp(0.0, 1.0);

    let lattice_mode = if reading.distortion_level > 0.6 || healing_score < 0.2 {
        LatticeMode::Distortion
    } else if healing_score >= 0.7 && reading.field_purity >= 0.8 {
        LatticeMode::GaiaResonance
    } else if healing_score >= 0.4 {
        LatticeMode::CarrierActive
    } else {
        LatticeMode::Nullifying
    };

    LatticeSnapshot {
        healing_score,
        lattice_mode,
        reading,
    }
}

/// Shielding strength of the field, in [0, 1]. Feeds the unified power index.
pub fn protection_level(reading: &LatticeReading) -> f64 {
    (reading.field_purity * (1.0 - reading.distortion_level)).clamp(0.0, 1.0)
}

/// Frequency derivations for the lattice surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyAnalysis {
    pub dominant_hz: f64,
    pub carrier_deviation_hz: f64,
    /// 1.0 when recent readings hold a steady frequency, lower as they wander.
    pub stability: f64,
}

/// Field derivations for the lattice surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetrics {
    pub field_purity: f64,
    pub protection_level: f64,
    pub healing_score: f64,
}

/// Full payload returned by every lattice action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatticeReport {
    pub lattice_state: LatticeSnapshot,
    pub history: Vec<LatticeReading>,
    pub frequency_analysis: FrequencyAnalysis,
    pub field_metrics: FieldMetrics,
    pub recommendations: Vec<String>,
}

/// Assemble the surface report from a classified snapshot and history.
pub fn build_report(snapshot: LatticeSnapshot, history: Vec<LatticeReading>) -> LatticeReport {
    let deviation = snapshot.reading.dominant_hz - CARRIER_HZ;

    let stability = if history.len() < 2 {
        1.0
    } else {
        let mean =
            history.iter().map(|r| r.dominant_hz).sum::<f64>() / history.len() as f64;
        let variance = history
            .iter()
            .map(|r| (r.dominant_hz - mean).powi(2))
            .sum::<f64>()
            / history.len() as f64;
        (1.0 - variance.sqrt() / 50.0).clamp(0.0, 1.0)
    };

    let frequency_analysis = FrequencyAnalysis {
        dominant_hz: snapshot.reading.dominant_hz,
        carrier_deviation_hz: deviation,
        stability,
    };
    let field_metrics = FieldMetrics {
        field_purity: snapshot.reading.field_purity,
        protection_level: protection_level(&snapshot.reading),
        healing_score: snapshot.healing_score,
    };

    let mut recommendations = Vec::new();
    if snapshot.lattice_mode == LatticeMode::Distortion {
        recommendations.push("Distortion dominant: run cleanse before trading resumes".to_string());
    }
    if deviation.abs() > 20.0 {
        recommendations.push(format!(
            "Dominant frequency off carrier by {:.1} Hz: tune toward {:.0} Hz",
            deviation.abs(),
            CARRIER_HZ
        ));
    }
    if snapshot.reading.field_purity < 0.5 {
        recommendations.push("Field purity low: purify_field or shield recommended".to_string());
    }
    if snapshot.reading.carrier_strength < 0.4 {
        recommendations.push("Carrier weak: amplify_carrier recommended".to_string());
    }
    if stability < 0.6 {
        recommendations.push("Frequency unstable across recent readings: harmonize".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("Lattice nominal: no adjustment needed".to_string());
    }

    LatticeReport {
        lattice_state: snapshot,
        history,
        frequency_analysis,
        field_metrics,
        recommendations,
    }
}

/// Simulated lattice source with adjustable parameters.
pub struct SimulatedLattice {
    state: Mutex<SimState>,
}

struct SimState {
    rng: rand::rngs::StdRng,
    dominant_hz: f64,
    carrier_strength: f64,
    distortion_level: f64,
    field_purity: f64,
    history: VecDeque<LatticeReading>,
}

impl SimulatedLattice {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        };
        Self {
            state: Mutex::new(SimState {
                rng,
                dominant_hz: CARRIER_HZ,
                carrier_strength: 0.6,
                distortion_level: 0.2,
                field_purity: 0.7,
                history: VecDeque::with_capacity(HISTORY_DEPTH),
            }),
        }
    }
}

impl SimState {
    fn sample(&mut self) -> LatticeReading {
        let reading = LatticeReading {
            dominant_hz: self.dominant_hz + self.rng.gen_range(-5.0..5.0),
            carrier_strength: (self.carrier_strength + self.rng.gen_range(-0.05..0.05))
                .clamp(0.0, 1.0),
            distortion_level: (self.distortion_level + self.rng.gen_range(-0.05..0.05))
                .clamp(0.0, 1.0),
            field_purity: (self.field_purity + self.rng.gen_range(-0.05..0.05)).clamp(0.0, 1.0),
        };
        if self.history.len() == HISTORY_DEPTH {
            self.history.pop_front();
        }
        self.history.push_back(reading.clone());
        reading
    }

    fn apply(&mut self, adjustment: LatticeAdjustment) {
        match adjustment {
            LatticeAdjustment::Tune { target_hz } => {
                self.dominant_hz = target_hz;
            }
            LatticeAdjustment::Cleanse => {
                self.distortion_level *= 0.5;
            }
            LatticeAdjustment::Harmonize => {
                self.dominant_hz += (CARRIER_HZ - self.dominant_hz) * 0.5;
                self.carrier_strength = (self.carrier_strength + 0.15).min(1.0);
            }
            LatticeAdjustment::Shield => {
                self.field_purity = (self.field_purity + 0.10).min(1.0);
                self.distortion_level = self.distortion_level.min(0.4);
            }
            LatticeAdjustment::AmplifyCarrier => {
                self.carrier_strength = (self.carrier_strength + 0.10).min(1.0);
            }
            LatticeAdjustment::PurifyField => {
                self.field_purity = (self.field_purity + 0.15).min(1.0);
            }
        }
    }
}

#[async_trait]
impl LatticeProvider for SimulatedLattice {
    async fn read(&self) -> Result<LatticeReading> {
        let mut state = self.state.lock().expect("lattice sim lock poisoned");
        Ok(state.sample())
    }

    async fn adjust(&self, adjustment: LatticeAdjustment) -> Result<LatticeReading> {
        let mut state = self.state.lock().expect("lattice sim lock poisoned");
        state.apply(adjustment);
        Ok(state.sample())
    }

    async fn history(&self) -> Vec<LatticeReading> {
        let state = self.state.lock().expect("lattice sim lock poisoned");
        state.history.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distorted_field_classifies_as_distortion() {
        let snapshot = classify(LatticeReading {
            dominant_hz: CARRIER_HZ,
            carrier_strength: 0.9,
            distortion_level: 0.7,
            field_purity: 0.9,
        });
        assert_eq!(snapshot.lattice_mode, LatticeMode::Distortion);
    }

    #[test]
    fn test_pure_strong_field_reaches_gaia_resonance() {
        let snapshot = classify(LatticeReading {
            dominant_hz: CARRIER_HZ,
            carrier_strength: 0.95,
            distortion_level: 0.05,
            field_purity: 0.9,
        });
        assert_eq!(snapshot.lattice_mode, LatticeMode::GaiaResonance);
        assert!(snapshot.healing_score >= 0.7);
    }

    #[test]
    fn test_neutral_baseline_is_carrier_active() {
        assert_eq!(
            classify(neutral_reading()).lattice_mode,
            LatticeMode::CarrierActive
        );
    }

    #[test]
    fn test_off_carrier_frequency_degrades_healing() {
        let on = classify(LatticeReading {
            dominant_hz: CARRIER_HZ,
            carrier_strength: 0.8,
            distortion_level: 0.1,
            field_purity: 0.8,
        });
        let off = classify(LatticeReading {
            dominant_hz: CARRIER_HZ + 200.0,
            carrier_strength: 0.8,
            distortion_level: 0.1,
            field_purity: 0.8,
        });
        assert!(on.healing_score > off.healing_score);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let sim = SimulatedLattice::new(Some(11));
        for _ in 0..25 {
            sim.read().await.unwrap();
        }
        assert_eq!(sim.history().await.len(), HISTORY_DEPTH);
    }

    #[tokio::test]
    async fn test_cleanse_halves_distortion() {
        let sim = SimulatedLattice::new(Some(3));
        let before = {
            let state = sim.state.lock().unwrap();
            state.distortion_level
        };
        sim.adjust(LatticeAdjustment::Cleanse).await.unwrap();
        let after = sim.state.lock().unwrap().distortion_level;
        assert!((after - before * 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_tune_retargets_frequency() {
        let sim = SimulatedLattice::new(Some(5));
        sim.adjust(LatticeAdjustment::Tune { target_hz: 432.0 })
            .await
            .unwrap();
        assert_eq!(sim.state.lock().unwrap().dominant_hz, 432.0);
    }

    #[test]
    fn test_report_recommends_cleanse_under_distortion() {
        let snapshot = classify(LatticeReading {
            dominant_hz: CARRIER_HZ,
            carrier_strength: 0.9,
            distortion_level: 0.8,
            field_purity: 0.9,
        });
        let report = build_report(snapshot, vec![]);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("cleanse")));
    }
}
