use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Persisted supreme-override flags.
///
/// Stored as a single row so every orchestrator instance sees the same
/// authority state across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityState {
    /// Process-wide trading halt; running sessions are paused while set.
    pub halt_active: bool,
    /// When set, agents trade even against a closed gate.
    pub override_cosmic_gates: bool,
    /// When set, `start` skips the minimum-capital check.
    pub bypass_validation: bool,
    /// When set, replaces the aggregated trading multiplier outright.
    pub forced_multiplier: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl AuthorityState {
    pub fn neutral() -> Self {
        Self {
            halt_active: false,
            override_cosmic_gates: false,
            bypass_validation: false,
            forced_multiplier: None,
            updated_at: Utc::now(),
        }
    }
}
