//! Order execution
//!
//! Order lifecycle plus the submission collaborator boundary. The default
//! paper engine fills instantly; a real exchange adapter can confirm
//! asynchronously via the same cumulative fill reports.

mod paper;
mod types;

pub use paper::PaperEngine;
pub use types::{FillReport, Order, OrderId, OrderSide, OrderStatus, OrderType};

use async_trait::async_trait;

/// Trait for order submission collaborators
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Submit an order, returning the first fill confirmation
    async fn submit_order(&self, order: &Order) -> anyhow::Result<FillReport>;
    /// Cancel an open order
    async fn cancel_order(&self, id: OrderId) -> anyhow::Result<()>;
}
