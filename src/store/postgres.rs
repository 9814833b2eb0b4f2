use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{
    Agent, AuthorityState, Hive, HiveStatus, Session, SessionStatus,
};
use crate::error::{HivemindError, Result};

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

fn row_to_session(row: &PgRow) -> Result<Session> {
    let status: String = row.get("status");
    Ok(Session {
        id: row.get("id"),
        owner: row.get("owner"),
        initial_capital: row.get("initial_capital"),
        current_equity: row.get("current_equity"),
        status: SessionStatus::try_from(status.as_str()).map_err(HivemindError::Internal)?,
        steps_executed: row.get("steps_executed"),
        total_trades: row.get("total_trades"),
        total_hives_spawned: row.get("total_hives_spawned"),
        root_hive_id: row.get("root_hive_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_hive(row: &PgRow) -> Result<Hive> {
    let status: String = row.get("status");
    Ok(Hive {
        id: row.get("id"),
        session_id: row.get("session_id"),
        parent_hive_id: row.get("parent_hive_id"),
        generation: row.get("generation"),
        initial_balance: row.get("initial_balance"),
        current_balance: row.get("current_balance"),
        status: HiveStatus::try_from(status.as_str()).map_err(HivemindError::Internal)?,
        num_agents: row.get("num_agents"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_agent(row: &PgRow) -> Agent {
    Agent {
        id: row.get("id"),
        hive_id: row.get("hive_id"),
        agent_index: row.get("agent_index"),
        current_symbol: row.get("current_symbol"),
        position_open: row.get("position_open"),
        last_trade_at: row.get("last_trade_at"),
    }
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ==================== Sessions ====================

    /// Insert a session with its root hive and agent set in one transaction.
    /// A failure anywhere rolls back all three writes.
    #[instrument(skip(self, session, root_hive, agents))]
    pub async fn create_session_tree(
        &self,
        session: &Session,
        root_hive: &Hive,
        agents: &[Agent],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sessions
                (id, owner, initial_capital, current_equity, status, steps_executed,
                 total_trades, total_hives_spawned, root_hive_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(session.id)
        .bind(&session.owner)
        .bind(session.initial_capital)
        .bind(session.current_equity)
        .bind(session.status.as_str())
        .bind(session.steps_executed)
        .bind(session.total_trades)
        .bind(session.total_hives_spawned)
        .bind(session.root_hive_id)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_hive_tx(&mut tx, root_hive).await?;
        for agent in agents {
            Self::insert_agent_tx(&mut tx, agent).await?;
        }

        tx.commit().await?;
        debug!(session_id = %session.id, "created session tree");
        Ok(())
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_session).transpose()
    }

    /// Set a session's status. Returns false when the session does not exist.
    pub async fn set_session_status(&self, id: Uuid, status: SessionStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mass-transition for emergency halt. Returns affected count.
    pub async fn pause_running_sessions(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET status = 'paused', updated_at = NOW() WHERE status = 'running'",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mass-transition for emergency resume. Returns affected count.
    pub async fn resume_paused_sessions(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET status = 'running', updated_at = NOW() WHERE status = 'paused'",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Sessions the internal ticker should be stepping.
    pub async fn list_running_sessions(&self) -> Result<Vec<Session>> {
        let rows = sqlx::query(
            "SELECT * FROM sessions WHERE status = 'running' ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_session).collect()
    }

    /// Compare-and-set step guard: advances `steps_executed` only when the
    /// session is still running and nobody else advanced it first. Returns
    /// false when the guard loses, which the caller maps to a step conflict.
    #[instrument(skip(self))]
    pub async fn begin_step(&self, session_id: Uuid, expected_step: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET steps_executed = steps_executed + 1, updated_at = NOW()
            WHERE id = $1 AND status = 'running' AND steps_executed = $2
            "#,
        )
        .bind(session_id)
        .bind(expected_step)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Persist step outcome counters.
    pub async fn finalize_step(
        &self,
        session_id: Uuid,
        equity: Decimal,
        trades_delta: i64,
        spawned_delta: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET current_equity = $2,
                total_trades = total_trades + $3,
                total_hives_spawned = total_hives_spawned + $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(equity)
        .bind(trades_delta)
        .bind(spawned_delta)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ==================== Hives ====================

    async fn insert_hive_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        hive: &Hive,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hives
                (id, session_id, parent_hive_id, generation, initial_balance,
                 current_balance, status, num_agents, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(hive.id)
        .bind(hive.session_id)
        .bind(hive.parent_hive_id)
        .bind(hive.generation)
        .bind(hive.initial_balance)
        .bind(hive.current_balance)
        .bind(hive.status.as_str())
        .bind(hive.num_agents)
        .bind(hive.created_at)
        .bind(hive.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_agent_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        agent: &Agent,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agents
                (id, hive_id, agent_index, current_symbol, position_open, last_trade_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(agent.id)
        .bind(agent.hive_id)
        .bind(agent.agent_index)
        .bind(&agent.current_symbol)
        .bind(agent.position_open)
        .bind(agent.last_trade_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Insert a hive and its agents (manual spawn via the control surface).
    pub async fn insert_hive_with_agents(&self, hive: &Hive, agents: &[Agent]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_hive_tx(&mut tx, hive).await?;
        for agent in agents {
            Self::insert_agent_tx(&mut tx, agent).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_hive(&self, id: Uuid) -> Result<Option<Hive>> {
        let row = sqlx::query("SELECT * FROM hives WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_hive).transpose()
    }

    /// All non-terminated hives of a session, oldest generation first.
    pub async fn active_hives(&self, session_id: Uuid) -> Result<Vec<Hive>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM hives
            WHERE session_id = $1 AND status = 'active'
            ORDER BY generation ASC, created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_hive).collect()
    }

    /// Every hive of a session, terminated included (status projection).
    pub async fn session_hives(&self, session_id: Uuid) -> Result<Vec<Hive>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM hives
            WHERE session_id = $1
            ORDER BY generation ASC, created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_hive).collect()
    }

    /// Apply one spawn transactionally: decrement the parent balance with a
    /// compare-and-set on its pre-spawn value, then insert the child and its
    /// agents. Returns false (and rolls back) when the CAS loses, so a
    /// concurrent step cannot double-spawn from the same balance.
    #[instrument(skip(self, child, agents))]
    pub async fn apply_spawn(
        &self,
        parent_id: Uuid,
        parent_balance_before: Decimal,
        child: &Hive,
        agents: &[Agent],
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let harvested = child.initial_balance;
        let result = sqlx::query(
            r#"
            UPDATE hives
            SET current_balance = current_balance - $3, updated_at = NOW()
            WHERE id = $1 AND status = 'active' AND current_balance = $2
            "#,
        )
        .bind(parent_id)
        .bind(parent_balance_before)
        .bind(harvested)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        Self::insert_hive_tx(&mut tx, child).await?;
        for agent in agents {
            Self::insert_agent_tx(&mut tx, agent).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Overwrite a hive's balance (simulated trading PnL application).
    pub async fn set_hive_balance(&self, id: Uuid, balance: Decimal) -> Result<()> {
        sqlx::query(
            "UPDATE hives SET current_balance = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(balance)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Add capital to an active hive. Returns false for unknown/terminated.
    pub async fn boost_hive(&self, id: Uuid, amount: Decimal) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE hives
            SET current_balance = current_balance + $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(amount)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Terminate a hive. Idempotent; never touches descendants.
    pub async fn terminate_hive(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE hives SET status = 'terminated', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ==================== Agents ====================

    pub async fn agents_for_hive(&self, hive_id: Uuid) -> Result<Vec<Agent>> {
        let rows = sqlx::query(
            "SELECT * FROM agents WHERE hive_id = $1 ORDER BY agent_index ASC",
        )
        .bind(hive_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_agent).collect())
    }

    pub async fn agents_for_session(&self, session_id: Uuid) -> Result<Vec<Agent>> {
        let rows = sqlx::query(
            r#"
            SELECT a.* FROM agents a
            JOIN hives h ON h.id = a.hive_id
            WHERE h.session_id = $1
            ORDER BY h.generation ASC, a.agent_index ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_agent).collect())
    }

    /// Record an accepted order: stamps the trade time and rotates symbol.
    pub async fn record_agent_trade(
        &self,
        agent_id: Uuid,
        symbol: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE agents
            SET current_symbol = $2, position_open = TRUE, last_trade_at = $3
            WHERE id = $1
            "#,
        )
        .bind(agent_id)
        .bind(symbol)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ==================== Authority ====================

    pub async fn get_authority(&self) -> Result<AuthorityState> {
        let row = sqlx::query("SELECT * FROM authority_state WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(AuthorityState {
            halt_active: row.get("halt_active"),
            override_cosmic_gates: row.get("override_cosmic_gates"),
            bypass_validation: row.get("bypass_validation"),
            forced_multiplier: row.get("forced_multiplier"),
            updated_at: row.get("updated_at"),
        })
    }

    pub async fn set_halt(&self, active: bool) -> Result<()> {
        sqlx::query(
            "UPDATE authority_state SET halt_active = $1, updated_at = NOW() WHERE id = 1",
        )
        .bind(active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_override_gates(&self, enabled: bool) -> Result<()> {
        sqlx::query(
            "UPDATE authority_state SET override_cosmic_gates = $1, updated_at = NOW() WHERE id = 1",
        )
        .bind(enabled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_bypass_validation(&self, enabled: bool) -> Result<()> {
        sqlx::query(
            "UPDATE authority_state SET bypass_validation = $1, updated_at = NOW() WHERE id = 1",
        )
        .bind(enabled)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_forced_multiplier(&self, multiplier: Option<Decimal>) -> Result<()> {
        sqlx::query(
            "UPDATE authority_state SET forced_multiplier = $1, updated_at = NOW() WHERE id = 1",
        )
        .bind(multiplier)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn reset_authority(&self) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE authority_state
            SET halt_active = FALSE,
                override_cosmic_gates = FALSE,
                bypass_validation = FALSE,
                forced_multiplier = NULL,
                updated_at = NOW()
            WHERE id = 1
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ==================== Audit ====================

    /// Append a control-surface audit entry. Best effort: failures are the
    /// caller's to ignore.
    pub async fn record_control_action(
        &self,
        action: &str,
        details: &str,
        actor_fingerprint: Option<&str>,
        metadata: &Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO control_audit_log (action, details, actor_fingerprint, metadata)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(action)
        .bind(details)
        .bind(actor_fingerprint)
        .bind(metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
