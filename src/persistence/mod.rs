//! Persistence boundary
//!
//! The engine saves after every mutating operation through this narrow
//! contract. Store failures are logged by the caller and never affect
//! execution state; the in-memory store stands in for a real database in
//! tests and paper trading.

mod memory;

pub use memory::InMemoryStore;

use crate::execution::Order;
use crate::executor::StrategyExecution;
use async_trait::async_trait;

/// Trait for execution/order persistence collaborators
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn save_execution(&self, execution: &StrategyExecution) -> anyhow::Result<()>;
    async fn save_order(&self, order: &Order) -> anyhow::Result<()>;
    /// Previously persisted executions, for warm restarts
    async fn load_executions(&self) -> anyhow::Result<Vec<StrategyExecution>>;
}
