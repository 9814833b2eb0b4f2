use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Paused,
    Stopped,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Stopped => "stopped",
        }
    }

    /// Stopped is terminal; running and paused can still transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Stopped)
    }
}

impl TryFrom<&str> for SessionStatus {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value {
            "running" => Ok(SessionStatus::Running),
            "paused" => Ok(SessionStatus::Paused),
            "stopped" => Ok(SessionStatus::Stopped),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level trading run coordinating a root hive and all descendants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub owner: String,
    pub initial_capital: Decimal,
    pub current_equity: Decimal,
    pub status: SessionStatus,
    pub steps_executed: i64,
    pub total_trades: i64,
    pub total_hives_spawned: i64,
    pub root_hive_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(owner: String, initial_capital: Decimal, root_hive_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            initial_capital,
            current_equity: initial_capital,
            status: SessionStatus::Running,
            steps_executed: 0,
            total_trades: 0,
            total_hives_spawned: 0,
            root_hive_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_round_trip() {
        for status in [
            SessionStatus::Running,
            SessionStatus::Paused,
            SessionStatus::Stopped,
        ] {
            assert_eq!(SessionStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(SessionStatus::try_from("halted").is_err());
    }

    #[test]
    fn test_new_session_starts_running() {
        let session = Session::new("owner-1".to_string(), dec!(1000), Uuid::new_v4());
        assert!(session.is_running());
        assert_eq!(session.current_equity, dec!(1000));
        assert_eq!(session.steps_executed, 0);
        assert!(!session.status.is_terminal());
        assert!(SessionStatus::Stopped.is_terminal());
    }
}
