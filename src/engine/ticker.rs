//! Optional internal ticker.
//!
//! When configured with a nonzero interval, steps every running session on a
//! fixed cadence so the orchestrator can run without an external pacer.
//! External step calls stay valid; the step-sequence guard resolves the race
//! and the ticker simply skips a session it lost.

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::HivemindError;

use super::SessionController;

/// Drive the ticker loop until the process shuts down. Call from a spawned
/// task; does nothing and returns immediately when the interval is zero.
pub async fn run(controller: SessionController, step_interval: Duration) {
    if step_interval.is_zero() {
        return;
    }

    info!(interval_secs = step_interval.as_secs(), "internal ticker started");
    let mut ticks = interval(step_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the first tick fires immediately; skip it so sessions get a full
    // interval before their first automatic step
    ticks.tick().await;

    loop {
        ticks.tick().await;
        tick_once(&controller).await;
    }
}

/// One pass over the running sessions. Per-session failures are logged and
/// never stop the sweep.
pub async fn tick_once(controller: &SessionController) {
    let sessions = match controller.store().list_running_sessions().await {
        Ok(sessions) => sessions,
        Err(err) => {
            warn!(error = %err, "ticker failed to list running sessions");
            return;
        }
    };

    for session in sessions {
        match controller.step(session.id).await {
            Ok(outcome) => {
                debug!(
                    session_id = %session.id,
                    step = outcome.step,
                    trades = outcome.trades,
                    "ticker stepped session"
                );
            }
            // lost to an external step or a halt landed mid-sweep
            Err(HivemindError::StepConflict(_)) | Err(HivemindError::State(_)) => {
                debug!(session_id = %session.id, "ticker skipped session");
            }
            Err(err) => {
                warn!(session_id = %session.id, error = %err, "ticker step failed");
            }
        }
    }
}
