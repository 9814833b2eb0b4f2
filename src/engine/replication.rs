//! Hive replication engine.
//!
//! Evaluated once per hive per step, after that hive's agents have proposed.
//! A spawn harvests a fixed fraction of the parent balance into a child of
//! the next generation; capital is conserved exactly.

use tracing::info;

use crate::domain::{Agent, Hive};
use rust_decimal::Decimal;

/// A spawn ready to be applied transactionally
#[derive(Debug, Clone)]
pub struct SpawnPlan {
    pub child: Hive,
    pub agents: Vec<Agent>,
    /// Parent balance the plan was computed from; the store compare-and-sets
    /// on this value so a concurrent step cannot double-spawn.
    pub parent_balance_before: Decimal,
}

/// Evaluate the spawn condition for one hive. At most one plan per call, and
/// the engine calls this at most once per hive per step.
pub fn evaluate(hive: &Hive) -> Option<SpawnPlan> {
    if !hive.should_spawn() {
        return None;
    }

    let harvested = hive.harvest_amount();
    let child = hive.child(harvested);
    let agents = (0..child.num_agents)
        .map(|index| Agent::new(child.id, index))
        .collect();

    info!(
        parent = %hive.id,
        child = %child.id,
        generation = child.generation,
        harvested = %harvested,
        "hive growth triggered spawn"
    );

    Some(SpawnPlan {
        child,
        agents,
        parent_balance_before: hive.current_balance,
    })
}
