//! Paper execution engine with simulated fills

use super::{ExecutionEngine, FillReport, Order, OrderId};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Deterministic fill model: every order fills immediately and completely at
/// its requested price, with commission proportional to notional
pub struct PaperEngine {
    commission_rate: Decimal,
    fills: Arc<RwLock<Vec<FillReport>>>,
}

impl PaperEngine {
    pub fn new(commission_rate: Decimal) -> Self {
        Self {
            commission_rate,
            fills: Arc::new(RwLock::new(vec![])),
        }
    }

    /// All fills produced so far, in submission order
    pub async fn fills(&self) -> Vec<FillReport> {
        self.fills.read().await.clone()
    }
}

#[async_trait]
impl ExecutionEngine for PaperEngine {
    async fn submit_order(&self, order: &Order) -> anyhow::Result<FillReport> {
        let fill_price = order
            .price
            .ok_or_else(|| anyhow::anyhow!("paper engine requires a requested price"))?;

        let fill = FillReport {
            order_id: order.order_id,
            cumulative_quantity: order.quantity,
            fill_price,
            commission: order.quantity * fill_price * self.commission_rate,
            timestamp: Utc::now(),
        };

        self.fills.write().await.push(fill.clone());
        tracing::info!(order_id = %order.order_id, symbol = %order.symbol, "paper order filled");
        Ok(fill)
    }

    async fn cancel_order(&self, id: OrderId) -> anyhow::Result<()> {
        tracing::info!(order_id = %id, "paper order cancelled");
        Ok(())
    }
}
