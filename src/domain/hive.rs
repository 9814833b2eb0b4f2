use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::limits::{HARVEST_FRACTION, MAX_GENERATIONS, SPAWN_MULTIPLIER};

/// Hive lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiveStatus {
    Active,
    Terminated,
}

impl HiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HiveStatus::Active => "active",
            HiveStatus::Terminated => "terminated",
        }
    }
}

impl TryFrom<&str> for HiveStatus {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value {
            "active" => Ok(HiveStatus::Active),
            "terminated" => Ok(HiveStatus::Terminated),
            other => Err(format!("unknown hive status: {other}")),
        }
    }
}

/// A capital pool with a fixed agent set and a generation number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hive {
    pub id: Uuid,
    pub session_id: Uuid,
    pub parent_hive_id: Option<Uuid>,
    pub generation: i32,
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub status: HiveStatus,
    pub num_agents: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hive {
    /// Root hive for a new session
    pub fn root(session_id: Uuid, capital: Decimal, num_agents: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id,
            parent_hive_id: None,
            generation: 0,
            initial_balance: capital,
            current_balance: capital,
            status: HiveStatus::Active,
            num_agents,
            created_at: now,
            updated_at: now,
        }
    }

    /// Child hive harvested from this one. Caller is responsible for
    /// decrementing the parent balance by the same amount.
    pub fn child(&self, harvested: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id: self.session_id,
            parent_hive_id: Some(self.id),
            generation: self.generation + 1,
            initial_balance: harvested,
            current_balance: harvested,
            status: HiveStatus::Active,
            num_agents: self.num_agents,
            created_at: now,
            updated_at: now,
        }
    }

    /// Growth multiplier relative to starting capital.
    /// A zero initial balance never reports growth.
    pub fn growth_multiplier(&self) -> Decimal {
        if self.initial_balance.is_zero() {
            return Decimal::ZERO;
        }
        self.current_balance / self.initial_balance
    }

    /// Whether this hive qualifies for a spawn this step.
    pub fn should_spawn(&self) -> bool {
        self.status == HiveStatus::Active
            && self.generation < MAX_GENERATIONS
            && self.growth_multiplier() >= SPAWN_MULTIPLIER
    }

    /// Amount harvested into a child when a spawn fires.
    pub fn harvest_amount(&self) -> Decimal {
        self.current_balance * HARVEST_FRACTION
    }
}
