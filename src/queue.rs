//! Order queue client.
//!
//! The queue itself is an external rate-limited collaborator (leaky-bucket
//! admission, priority-FIFO drain). This module only speaks its API:
//! fire-and-forget enqueue plus the maintenance verbs the control surface
//! exposes. Enqueue failures degrade to a rejected result; the orchestrator
//! never blocks a step on queue health.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{OrderProposal, OrderSide};
use crate::error::Result;

/// Queue admission verdict for one enqueue call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResult {
    pub accepted: bool,
    #[serde(default)]
    pub queue_id: Option<String>,
}

impl EnqueueResult {
    pub fn rejected() -> Self {
        Self {
            accepted: false,
            queue_id: None,
        }
    }
}

/// Wire payload for the external queue's enqueue endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueRequest<'a> {
    session_id: Uuid,
    hive_id: Uuid,
    agent_id: Uuid,
    symbol: &'a str,
    side: OrderSide,
    quantity: Decimal,
    price: Decimal,
    priority: i32,
    metadata: &'a Value,
}

/// Client contract for the external order queue
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderQueue: Send + Sync {
    /// Submit one proposal with its gate snapshot as audit metadata.
    async fn enqueue(&self, proposal: &OrderProposal, metadata: &Value) -> EnqueueResult;

    /// Drop all queued orders.
    async fn clear(&self) -> Result<u64>;

    /// Re-prioritize a queued order.
    async fn prioritize(&self, order_id: &str, priority: i32) -> Result<()>;

    /// Ask the queue to drain immediately, ignoring its pacing.
    async fn force_process(&self) -> Result<u64>;
}

/// HTTP client for the queue service
pub struct HttpOrderQueue {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderQueue {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl OrderQueue for HttpOrderQueue {
    async fn enqueue(&self, proposal: &OrderProposal, metadata: &Value) -> EnqueueResult {
        let body = EnqueueRequest {
            session_id: proposal.session_id,
            hive_id: proposal.hive_id,
            agent_id: proposal.agent_id,
            symbol: &proposal.symbol,
            side: proposal.side,
            quantity: proposal.quantity,
            price: proposal.price,
            priority: proposal.priority,
            metadata,
        };

        let response = self
            .client
            .post(self.url("/orders"))
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<EnqueueResult>().await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(error = %e, "queue returned unparseable enqueue response");
                        EnqueueResult::rejected()
                    }
                }
            }
            Ok(resp) => {
                debug!(status = %resp.status(), "queue rejected enqueue");
                EnqueueResult::rejected()
            }
            Err(e) => {
                warn!(error = %e, "queue enqueue transport failure");
                EnqueueResult::rejected()
            }
        }
    }

    async fn clear(&self) -> Result<u64> {
        let resp = self
            .client
            .delete(self.url("/orders"))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| crate::error::HivemindError::Queue(e.to_string()))?;
        let cleared: u64 = resp.json::<ClearedResponse>().await?.cleared;
        Ok(cleared)
    }

    async fn prioritize(&self, order_id: &str, priority: i32) -> Result<()> {
        self.client
            .patch(self.url(&format!("/orders/{order_id}/priority")))
            .json(&serde_json::json!({ "priority": priority }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| crate::error::HivemindError::Queue(e.to_string()))?;
        Ok(())
    }

    async fn force_process(&self) -> Result<u64> {
        let resp = self
            .client
            .post(self.url("/orders/drain"))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| crate::error::HivemindError::Queue(e.to_string()))?;
        let processed: u64 = resp.json::<ProcessedResponse>().await?.processed;
        Ok(processed)
    }
}

#[derive(Deserialize)]
struct ClearedResponse {
    cleared: u64,
}

#[derive(Deserialize)]
struct ProcessedResponse {
    processed: u64,
}

/// No-op queue used when no queue URL is configured. Accepts everything so
/// the rest of the pipeline (counters, symbol rotation) behaves as in
/// production.
pub struct NullOrderQueue;

#[async_trait]
impl OrderQueue for NullOrderQueue {
    async fn enqueue(&self, proposal: &OrderProposal, _metadata: &Value) -> EnqueueResult {
        debug!(
            symbol = %proposal.symbol,
            side = %proposal.side,
            quantity = %proposal.quantity,
            "dry-run enqueue accepted"
        );
        EnqueueResult {
            accepted: true,
            queue_id: Some(Uuid::new_v4().to_string()),
        }
    }

    async fn clear(&self) -> Result<u64> {
        Ok(0)
    }

    async fn prioritize(&self, _order_id: &str, _priority: i32) -> Result<()> {
        Ok(())
    }

    async fn force_process(&self) -> Result<u64> {
        Ok(0)
    }
}
