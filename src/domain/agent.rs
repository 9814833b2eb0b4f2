use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::limits::SYMBOL_UNIVERSE;

/// A per-hive unit proposing at most one order per step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub hive_id: Uuid,
    pub agent_index: i32,
    pub current_symbol: String,
    pub position_open: bool,
    pub last_trade_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn new(hive_id: Uuid, agent_index: i32) -> Self {
        let symbol = SYMBOL_UNIVERSE[agent_index as usize % SYMBOL_UNIVERSE.len()];
        Self {
            id: Uuid::new_v4(),
            hive_id,
            agent_index,
            current_symbol: symbol.to_string(),
            position_open: false,
            last_trade_at: None,
        }
    }

    /// Next symbol in the fixed universe, used after an accepted order.
    pub fn rotate_symbol(&self) -> String {
        let pos = SYMBOL_UNIVERSE
            .iter()
            .position(|s| *s == self.current_symbol)
            .unwrap_or(0);
        SYMBOL_UNIVERSE[(pos + 1) % SYMBOL_UNIVERSE.len()].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agents_start_spread_over_universe() {
        let hive_id = Uuid::new_v4();
        let a0 = Agent::new(hive_id, 0);
        let a1 = Agent::new(hive_id, 1);
        assert_ne!(a0.current_symbol, a1.current_symbol);
        assert!(SYMBOL_UNIVERSE.contains(&a0.current_symbol.as_str()));
    }

    #[test]
    fn test_rotate_symbol_wraps() {
        let mut agent = Agent::new(Uuid::new_v4(), 0);
        for _ in 0..SYMBOL_UNIVERSE.len() {
            agent.current_symbol = agent.rotate_symbol();
        }
        assert_eq!(agent.current_symbol, SYMBOL_UNIVERSE[0]);
    }
}
