use chrono::{DateTime, Utc};

use crate::engine::SessionController;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Orchestration engine: sessions, authority, oracles, queue
    pub controller: SessionController,

    /// Bearer token required on every API call
    pub api_token: String,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(controller: SessionController, api_token: String) -> Self {
        Self {
            controller,
            api_token,
            start_time: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
