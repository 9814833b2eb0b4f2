//! Oracle providers and the gating aggregator.
//!
//! The three oracles are independent external heuristics behind opaque
//! provider traits. They are queried at most once per step, concurrently;
//! any failure or timeout substitutes the documented neutral baseline so a
//! flaky oracle derates trading instead of halting it.

pub mod aggregator;
pub mod lattice;
pub mod planetary;
pub mod stargate;

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::{GateSnapshot, LatticeSnapshot, PlanetarySnapshot, StargateSnapshot};

pub use aggregator::{cosmic_dashboard, CosmicDashboard, SystemState};
pub use lattice::{LatticeAdjustment, LatticeProvider, LatticeReport, SimulatedLattice};
pub use planetary::{PlanetaryProvider, SimulatedPlanetary};
pub use stargate::{SimulatedStargate, StargateProvider};

/// Fan-out/fan-in front for the three oracle providers
#[derive(Clone)]
pub struct OracleHub {
    stargate: Arc<dyn StargateProvider>,
    planetary: Arc<dyn PlanetaryProvider>,
    lattice: Arc<dyn LatticeProvider>,
    timeout: Duration,
}

impl OracleHub {
    pub fn new(
        stargate: Arc<dyn StargateProvider>,
        planetary: Arc<dyn PlanetaryProvider>,
        lattice: Arc<dyn LatticeProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            stargate,
            planetary,
            lattice,
            timeout,
        }
    }

    /// Simulated providers with a shared seed (tests, local runs).
    pub fn simulated(seed: Option<u64>, timeout: Duration) -> Self {
        Self::new(
            Arc::new(SimulatedStargate::new(seed)),
            Arc::new(SimulatedPlanetary::new(seed)),
            Arc::new(SimulatedLattice::new(seed)),
            timeout,
        )
    }

    pub fn lattice_provider(&self) -> Arc<dyn LatticeProvider> {
        Arc::clone(&self.lattice)
    }

    /// Query all three oracles concurrently and aggregate one gate snapshot.
    /// This is the only oracle read a step performs.
    pub async fn gate_snapshot(&self) -> GateSnapshot {
        let (stargate, planetary, lattice) = tokio::join!(
            self.stargate_snapshot(),
            self.planetary_snapshot(),
            self.lattice_snapshot(),
        );
        aggregator::aggregate(stargate, planetary, lattice)
    }

    /// Unified dashboard over a fresh fan-out read.
    pub async fn cosmic(&self) -> CosmicDashboard {
        cosmic_dashboard(self.gate_snapshot().await)
    }

    async fn stargate_snapshot(&self) -> StargateSnapshot {
        let reading = match tokio::time::timeout(self.timeout, self.stargate.read()).await {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => {
                warn!(error = %e, "stargate oracle failed, using neutral baseline");
                stargate::neutral_reading()
            }
            Err(_) => {
                warn!("stargate oracle timed out, using neutral baseline");
                stargate::neutral_reading()
            }
        };
        stargate::classify(reading)
    }

    async fn planetary_snapshot(&self) -> PlanetarySnapshot {
        let reading = match tokio::time::timeout(self.timeout, self.planetary.read()).await {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => {
                warn!(error = %e, "planetary oracle failed, using neutral baseline");
                planetary::neutral_reading()
            }
            Err(_) => {
                warn!("planetary oracle timed out, using neutral baseline");
                planetary::neutral_reading()
            }
        };
        planetary::classify(reading)
    }

    async fn lattice_snapshot(&self) -> LatticeSnapshot {
        let reading = match tokio::time::timeout(self.timeout, self.lattice.read()).await {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => {
                warn!(error = %e, "lattice oracle failed, using neutral baseline");
                lattice::neutral_reading()
            }
            Err(_) => {
                warn!("lattice oracle timed out, using neutral baseline");
                lattice::neutral_reading()
            }
        };
        lattice::classify(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LatticeReading, PlanetaryReading, StargateReading};
    use crate::error::{HivemindError, Result};
    use async_trait::async_trait;

    struct FailingStargate;

    #[async_trait]
    impl StargateProvider for FailingStargate {
        async fn read(&self) -> Result<StargateReading> {
            Err(HivemindError::OracleUnavailable("grid monitor down".into()))
        }
    }

    struct SlowPlanetary;

    #[async_trait]
    impl PlanetaryProvider for SlowPlanetary {
        async fn read(&self) -> Result<PlanetaryReading> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(planetary::neutral_reading())
        }
    }

    struct FixedLattice;

    #[async_trait]
    impl LatticeProvider for FixedLattice {
        async fn read(&self) -> Result<LatticeReading> {
            Ok(lattice::neutral_reading())
        }

        async fn adjust(&self, _: LatticeAdjustment) -> Result<LatticeReading> {
            Ok(lattice::neutral_reading())
        }

        async fn history(&self) -> Vec<LatticeReading> {
            vec![]
        }
    }

    #[tokio::test]
    async fn test_failures_and_timeouts_fall_back_to_baselines() {
        tokio::time::pause();
        let hub = OracleHub::new(
            Arc::new(FailingStargate),
            Arc::new(SlowPlanetary),
            Arc::new(FixedLattice),
            Duration::from_millis(100),
        );
        let gate = hub.gate_snapshot().await;

        // all three resolved to neutral baselines: step proceeds, derated
        let expected = aggregator::aggregate(
            stargate::classify(stargate::neutral_reading()),
            planetary::classify(planetary::neutral_reading()),
            lattice::classify(lattice::neutral_reading()),
        );
        assert_eq!(gate.recommendation, expected.recommendation);
        assert_eq!(gate.trading_multiplier, expected.trading_multiplier);
    }
}
