//! Session controller: the top-level orchestration of start/step/stop/status.
//!
//! A step is synchronous and externally paced. It queries the oracles once,
//! evaluates every agent against that single gate snapshot, enqueues accepted
//! proposals fire-and-forget, then lets each hive evaluate its spawn
//! condition. The step-sequence compare-and-set enforces a single writer per
//! session; a lost race is a caller error, not something the engine resolves.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::limits::{AGENTS_PER_HIVE, MAX_GENERATIONS, MIN_CAPITAL};
use crate::domain::{
    Agent, AuthorityState, GateSnapshot, Hive, LatticeSnapshot, OrderProposal, OrderSide,
    PlanetarySnapshot, Recommendation, Session, SessionStatus, StargateSnapshot,
};
use crate::error::{HivemindError, Result};
use crate::oracles::OracleHub;
use crate::queue::{EnqueueResult, OrderQueue};
use crate::store::PostgresStore;

use super::authority::AuthorityService;
use super::{proposer, replication};

/// Simulated mark-to-model drift applied to a hive balance per accepted
/// order, as a fraction of the order notional.
const FILL_DRIFT_RANGE: std::ops::Range<f64> = -0.010..0.015;

/// Start response: the created session plus the opening oracle readings at
/// the top level of the payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    pub session: Session,
    pub stargate: StargateSnapshot,
    pub planetary: PlanetarySnapshot,
    pub lattice: LatticeSnapshot,
    pub recommendation: Recommendation,
}

impl StartOutcome {
    fn new(session: Session, gate: GateSnapshot) -> Self {
        Self {
            session,
            recommendation: gate.recommendation,
            stargate: gate.stargate,
            planetary: gate.planetary,
            lattice: gate.lattice,
        }
    }
}

/// Aggregated verdict carried on the step response next to the three raw
/// oracle snapshots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmicSummary {
    pub combined_power: f64,
    pub recommendation: Recommendation,
    pub trading_multiplier: f64,
}

impl From<&GateSnapshot> for CosmicSummary {
    fn from(gate: &GateSnapshot) -> Self {
        Self {
            combined_power: gate.combined_power,
            recommendation: gate.recommendation,
            trading_multiplier: gate.trading_multiplier,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: i64,
    pub trades: u64,
    pub equity: Decimal,
    pub hives: usize,
    pub agents: usize,
    pub stargate: StargateSnapshot,
    pub planetary: PlanetarySnapshot,
    pub lattice: LatticeSnapshot,
    pub cosmic: CosmicSummary,
}

impl StepOutcome {
    fn new(
        step: i64,
        trades: u64,
        equity: Decimal,
        hives: usize,
        agents: usize,
        gate: GateSnapshot,
    ) -> Self {
        Self {
            step,
            trades,
            equity,
            hives,
            agents,
            cosmic: CosmicSummary::from(&gate),
            stargate: gate.stargate,
            planetary: gate.planetary,
            lattice: gate.lattice,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutcome {
    pub session: Session,
    pub hives: Vec<Hive>,
    pub agents: Vec<Agent>,
}

#[derive(Clone)]
pub struct SessionController {
    store: Arc<PostgresStore>,
    oracles: OracleHub,
    queue: Arc<dyn OrderQueue>,
    authority: AuthorityService,
}

impl SessionController {
    pub fn new(store: Arc<PostgresStore>, oracles: OracleHub, queue: Arc<dyn OrderQueue>) -> Self {
        let authority = AuthorityService::new(Arc::clone(&store));
        Self {
            store,
            oracles,
            queue,
            authority,
        }
    }

    pub fn authority(&self) -> &AuthorityService {
        &self.authority
    }

    pub fn store(&self) -> &Arc<PostgresStore> {
        &self.store
    }

    pub fn oracles(&self) -> &OracleHub {
        &self.oracles
    }

    pub fn queue(&self) -> &Arc<dyn OrderQueue> {
        &self.queue
    }

    // ==================== Lifecycle ====================

    /// Create a session with its root hive and agents, all in one
    /// transaction, and return the opening gate reading.
    #[instrument(skip(self))]
    pub async fn start(&self, owner: &str, initial_capital: Decimal) -> Result<StartOutcome> {
        let authority = self.authority.state().await?;
        if !authority.bypass_validation && initial_capital < MIN_CAPITAL {
            return Err(HivemindError::Validation(format!(
                "initial capital {initial_capital} is below the minimum {MIN_CAPITAL}"
            )));
        }
        if owner.trim().is_empty() {
            return Err(HivemindError::Validation("owner must not be empty".into()));
        }

        let session_id = Uuid::new_v4();
        let root_hive = Hive::root(session_id, initial_capital, AGENTS_PER_HIVE);
        let agents: Vec<Agent> = (0..root_hive.num_agents)
            .map(|index| Agent::new(root_hive.id, index))
            .collect();
        let mut session = Session::new(owner.to_string(), initial_capital, root_hive.id);
        session.id = session_id;

        self.store
            .create_session_tree(&session, &root_hive, &agents)
            .await?;
        info!(session_id = %session.id, owner, %initial_capital, "session started");

        let gate = self.gated_snapshot(&authority).await;
        Ok(StartOutcome::new(session, gate))
    }

    /// Execute one step for a running session.
    #[instrument(skip(self))]
    pub async fn step(&self, session_id: Uuid) -> Result<StepOutcome> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(HivemindError::SessionNotFound(session_id))?;
        let authority = self.authority.state().await?;
        ensure_steppable(&session, &authority)?;

        // Single-writer guard: lose the CAS and the step is someone else's.
        if !self.store.begin_step(session_id, session.steps_executed).await? {
            return Err(HivemindError::StepConflict(session_id));
        }
        let step_number = session.steps_executed + 1;

        // One oracle fan-out per step; every agent sees the same snapshot.
        let gate = self.gated_snapshot(&authority).await;
        let gate_metadata = serde_json::to_value(&gate)?;

        let hives = self.store.active_hives(session_id).await?;
        let mut rng = StdRng::from_entropy();
        let mut trades: u64 = 0;
        let mut spawned: i64 = 0;
        let mut agent_count = 0usize;
        let mut hive_count = hives.len();
        let mut equity = Decimal::ZERO;

        for mut hive in hives {
            let agents = self.store.agents_for_hive(hive.id).await?;
            agent_count += agents.len();

            for agent in &agents {
                let Some(proposal) = proposer::propose(agent, &hive, &gate, &authority, &mut rng)
                else {
                    continue;
                };
                let result = self.queue.enqueue(&proposal, &gate_metadata).await;
                if result.accepted {
                    trades += 1;
                    hive.current_balance =
                        apply_fill_drift(hive.current_balance, &proposal, &mut rng);
                    self.store
                        .record_agent_trade(agent.id, &agent.rotate_symbol(), Utc::now())
                        .await?;
                    debug!(
                        agent = %agent.id,
                        symbol = %proposal.symbol,
                        side = %proposal.side,
                        queue_id = ?result.queue_id,
                        "order accepted by queue"
                    );
                }
            }

            self.store
                .set_hive_balance(hive.id, hive.current_balance)
                .await?;

            // Replication runs after this hive's agents, once per step.
            if let Some(plan) = replication::evaluate(&hive) {
                let applied = self
                    .store
                    .apply_spawn(hive.id, plan.parent_balance_before, &plan.child, &plan.agents)
                    .await?;
                if applied {
                    spawned += 1;
                    hive_count += 1;
                    agent_count += plan.agents.len();
                    hive.current_balance -= plan.child.initial_balance;
                    equity += plan.child.current_balance;
                } else {
                    warn!(hive = %hive.id, "spawn lost balance compare-and-set, skipped");
                }
            }

            equity += hive.current_balance;
        }

        self.store
            .finalize_step(session_id, equity, trades as i64, spawned)
            .await?;
        info!(
            %session_id,
            step = step_number,
            trades,
            spawned,
            %equity,
            "step completed"
        );

        Ok(StepOutcome::new(
            step_number,
            trades,
            equity,
            hive_count,
            agent_count,
            gate,
        ))
    }

    /// Stop a session. Terminal and idempotent; spawned hives are untouched.
    #[instrument(skip(self))]
    pub async fn stop(&self, session_id: Uuid) -> Result<String> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(HivemindError::SessionNotFound(session_id))?;

        if session.status == SessionStatus::Stopped {
            return Ok(format!("session {session_id} already stopped"));
        }

        self.store
            .set_session_status(session_id, SessionStatus::Stopped)
            .await?;
        info!(%session_id, "session stopped");
        Ok(format!("session {session_id} stopped"))
    }

    /// Read-only projection of the session, its hive tree, and agents.
    pub async fn status(&self, session_id: Uuid) -> Result<StatusOutcome> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(HivemindError::SessionNotFound(session_id))?;
        let hives = self.store.session_hives(session_id).await?;
        let agents = self.store.agents_for_session(session_id).await?;
        Ok(StatusOutcome {
            session,
            hives,
            agents,
        })
    }

    // ==================== Control surface ====================

    /// Submit an order directly, bypassing the proposer. With `bypass` the
    /// gate is not even consulted.
    #[instrument(skip(self))]
    pub async fn direct_trade(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        bypass: bool,
    ) -> Result<EnqueueResult> {
        if quantity <= Decimal::ZERO || price <= Decimal::ZERO {
            return Err(HivemindError::Validation(
                "direct trade quantity and price must be positive".into(),
            ));
        }

        let authority = self.authority.state().await?;
        let gate = self.gated_snapshot(&authority).await;
        if !bypass && !gate.permits_trading() && !authority.override_cosmic_gates {
            return Err(HivemindError::State(
                "gates closed; pass bypass=true to trade anyway".into(),
            ));
        }

        let proposal = OrderProposal {
            session_id: Uuid::nil(),
            hive_id: Uuid::nil(),
            agent_id: Uuid::nil(),
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
            priority: proposer::priority_for(gate.combined_power),
        };
        let metadata = serde_json::to_value(&gate)?;
        Ok(self.queue.enqueue(&proposal, &metadata).await)
    }

    /// Manually spawn a hive. With a parent, the child joins that hive's
    /// session one generation deeper (the cap still applies); without one, a
    /// fresh generation-0 hive is attached to the given session.
    #[instrument(skip(self))]
    pub async fn manual_spawn(
        &self,
        parent_hive_id: Option<Uuid>,
        session_id: Option<Uuid>,
        initial_balance: Decimal,
        num_agents: i32,
    ) -> Result<Hive> {
        if initial_balance <= Decimal::ZERO {
            return Err(HivemindError::Validation(
                "initial balance must be positive".into(),
            ));
        }
        if num_agents <= 0 {
            return Err(HivemindError::Validation(
                "agent count must be positive".into(),
            ));
        }

        let hive = match parent_hive_id {
            Some(parent_id) => {
                let parent = self
                    .store
                    .get_hive(parent_id)
                    .await?
                    .ok_or(HivemindError::HiveNotFound(parent_id))?;
                if parent.generation >= MAX_GENERATIONS {
                    return Err(HivemindError::Validation(format!(
                        "parent is already at the generation cap {MAX_GENERATIONS}"
                    )));
                }
                let mut child = parent.child(initial_balance);
                child.num_agents = num_agents;
                child
            }
            None => {
                let session_id = session_id.ok_or_else(|| {
                    HivemindError::Validation(
                        "either parentHiveId or sessionId is required".into(),
                    )
                })?;
                self.store
                    .get_session(session_id)
                    .await?
                    .ok_or(HivemindError::SessionNotFound(session_id))?;
                Hive::root(session_id, initial_balance, num_agents)
            }
        };

        let agents: Vec<Agent> = (0..num_agents).map(|i| Agent::new(hive.id, i)).collect();
        self.store.insert_hive_with_agents(&hive, &agents).await?;
        info!(hive = %hive.id, generation = hive.generation, "hive spawned via control");
        Ok(hive)
    }

    pub async fn boost_hive(&self, hive_id: Uuid, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(HivemindError::Validation(
                "boost amount must be positive".into(),
            ));
        }
        if !self.store.boost_hive(hive_id, amount).await? {
            return Err(HivemindError::HiveNotFound(hive_id));
        }
        Ok(())
    }

    pub async fn terminate_hive(&self, hive_id: Uuid) -> Result<()> {
        if !self.store.terminate_hive(hive_id).await? {
            return Err(HivemindError::HiveNotFound(hive_id));
        }
        info!(%hive_id, "hive terminated via control");
        Ok(())
    }

    // ==================== Internals ====================

    /// One oracle fan-out, with the persisted forced multiplier applied.
    async fn gated_snapshot(&self, authority: &AuthorityState) -> GateSnapshot {
        let mut gate = self.oracles.gate_snapshot().await;
        apply_forced_multiplier(&mut gate, authority);
        gate
    }
}

/// A session steps only while running and only when no process-wide halt is
/// engaged. No mutation happens on rejection.
pub fn ensure_steppable(session: &Session, authority: &AuthorityState) -> Result<()> {
    if authority.halt_active {
        return Err(HivemindError::State(
            "trading is halted by emergency authority".into(),
        ));
    }
    match session.status {
        SessionStatus::Running => Ok(()),
        status => Err(HivemindError::State(format!(
            "cannot step session {} in status {status}",
            session.id
        ))),
    }
}

/// The persisted forced multiplier replaces the aggregated one outright.
pub fn apply_forced_multiplier(gate: &mut GateSnapshot, authority: &AuthorityState) {
    if let Some(forced) = authority.forced_multiplier {
        if let Some(forced) = forced.to_f64() {
            gate.trading_multiplier = forced;
        }
    }
}

fn apply_fill_drift(
    balance: Decimal,
    proposal: &OrderProposal,
    rng: &mut impl Rng,
) -> Decimal {
    let notional = proposal.quantity * proposal.price;
    let drift = Decimal::from_f64(rng.gen_range(FILL_DRIFT_RANGE)).unwrap_or(Decimal::ZERO);
    (balance + notional * drift).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracles::{aggregator, lattice, planetary, stargate};
    use rust_decimal_macros::dec;

    fn running_session() -> Session {
        Session::new("owner".to_string(), dec!(1000), Uuid::new_v4())
    }

    fn neutral_gate() -> GateSnapshot {
        aggregator::aggregate(
            stargate::classify(stargate::neutral_reading()),
            planetary::classify(planetary::neutral_reading()),
            lattice::classify(lattice::neutral_reading()),
        )
    }

    #[test]
    fn test_stopped_session_is_not_steppable() {
        let mut session = running_session();
        session.status = SessionStatus::Stopped;
        let err = ensure_steppable(&session, &AuthorityState::neutral()).unwrap_err();
        assert!(matches!(err, HivemindError::State(_)));
    }

    #[test]
    fn test_halt_blocks_even_running_sessions() {
        let session = running_session();
        let mut authority = AuthorityState::neutral();
        assert!(ensure_steppable(&session, &authority).is_ok());
        authority.halt_active = true;
        assert!(ensure_steppable(&session, &authority).is_err());
    }

    #[test]
    fn test_forced_multiplier_replaces_aggregate() {
        let mut gate = neutral_gate();
        let mut authority = AuthorityState::neutral();
        authority.forced_multiplier = Some(dec!(7.5));
        apply_forced_multiplier(&mut gate, &authority);
        assert_eq!(gate.trading_multiplier, 7.5);

        let mut gate = neutral_gate();
        authority.forced_multiplier = None;
        let original = gate.trading_multiplier;
        apply_forced_multiplier(&mut gate, &authority);
        assert_eq!(gate.trading_multiplier, original);
    }

    #[test]
    fn test_fill_drift_bounded_and_non_negative() {
        let proposal = OrderProposal {
            session_id: Uuid::nil(),
            hive_id: Uuid::nil(),
            agent_id: Uuid::nil(),
            symbol: "BTC-USD".to_string(),
            side: OrderSide::Buy,
            quantity: dec!(1),
            price: dec!(100),
            priority: 5,
        };
        let mut rng = rand::rngs::StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            let next = apply_fill_drift(dec!(0.5), &proposal, &mut rng);
            assert!(next >= Decimal::ZERO);
            // drift is at most 1.5% of the 100 notional
            assert!(next <= dec!(0.5) + dec!(1.5));
        }
    }
}
