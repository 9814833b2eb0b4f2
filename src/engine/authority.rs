//! Supreme-override authority.
//!
//! All flags live in a single persisted control record so that halts and
//! overrides survive restarts and bind every orchestrator instance, not just
//! the one that received the control call.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::AuthorityState;
use crate::error::{HivemindError, Result};
use crate::store::PostgresStore;

/// Upper bound accepted for a forced trading multiplier.
const MAX_FORCED_MULTIPLIER: Decimal = dec!(10);

#[derive(Clone)]
pub struct AuthorityService {
    store: Arc<PostgresStore>,
}

impl AuthorityService {
    pub fn new(store: Arc<PostgresStore>) -> Self {
        Self { store }
    }

    pub async fn state(&self) -> Result<AuthorityState> {
        self.store.get_authority().await
    }

    /// Halt trading process-wide: set the persisted flag and pause every
    /// running session. Idempotent.
    pub async fn emergency_halt(&self) -> Result<u64> {
        self.store.set_halt(true).await?;
        let paused = self.store.pause_running_sessions().await?;
        warn!(paused, "emergency halt engaged");
        Ok(paused)
    }

    /// Lift the halt and resume every paused session. Idempotent.
    pub async fn emergency_resume(&self) -> Result<u64> {
        self.store.set_halt(false).await?;
        let resumed = self.store.resume_paused_sessions().await?;
        info!(resumed, "emergency halt lifted");
        Ok(resumed)
    }

    pub async fn set_override_gates(&self, enabled: bool) -> Result<()> {
        self.store.set_override_gates(enabled).await?;
        warn!(enabled, "cosmic gate override changed");
        Ok(())
    }

    pub async fn set_bypass_validation(&self, enabled: bool) -> Result<()> {
        self.store.set_bypass_validation(enabled).await?;
        warn!(enabled, "validation bypass changed");
        Ok(())
    }

    /// Force the trading multiplier for all future steps until reset.
    pub async fn set_forced_multiplier(&self, multiplier: Decimal) -> Result<()> {
        if multiplier < Decimal::ZERO || multiplier > MAX_FORCED_MULTIPLIER {
            return Err(HivemindError::Validation(format!(
                "forced multiplier must be within [0, {MAX_FORCED_MULTIPLIER}], got {multiplier}"
            )));
        }
        self.store.set_forced_multiplier(Some(multiplier)).await?;
        warn!(%multiplier, "trading multiplier forced");
        Ok(())
    }

    /// Clear every override back to neutral.
    pub async fn reset(&self) -> Result<AuthorityState> {
        self.store.reset_authority().await?;
        info!("authority state reset");
        self.store.get_authority().await
    }
}
