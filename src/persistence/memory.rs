//! In-memory store

use super::ExecutionStore;
use crate::execution::{Order, OrderId};
use crate::executor::StrategyExecution;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Map-backed store, substitutable for a real database without changing
/// engine behavior
#[derive(Default)]
pub struct InMemoryStore {
    executions: Arc<RwLock<HashMap<Uuid, StrategyExecution>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryStore {
    async fn save_execution(&self, execution: &StrategyExecution) -> anyhow::Result<()> {
        self.executions
            .write()
            .await
            .insert(execution.strategy_id, execution.clone());
        Ok(())
    }

    async fn save_order(&self, order: &Order) -> anyhow::Result<()> {
        self.orders.write().await.insert(order.order_id, order.clone());
        Ok(())
    }

    async fn load_executions(&self) -> anyhow::Result<Vec<StrategyExecution>> {
        Ok(self.executions.read().await.values().cloned().collect())
    }
}
