//! Order types and lifecycle

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order identifier
pub type OrderId = Uuid;

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
    TrailingStop,
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created from an accepted signal, not yet handed to the engine
    Pending,
    /// Handed to the execution collaborator
    Submitted,
    /// Some quantity filled, remainder open
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Cancelled | Self::Rejected | Self::Expired
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Submitted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Submitted, PartiallyFilled)
                | (Submitted, Filled)
                | (Submitted, Cancelled)
                | (Submitted, Rejected)
                | (Submitted, Expired)
                | (PartiallyFilled, PartiallyFilled)
                | (PartiallyFilled, Filled)
                | (PartiallyFilled, Cancelled)
                | (PartiallyFilled, Expired)
        )
    }
}

/// A fill confirmation from the execution collaborator
///
/// Quantities are cumulative, so re-delivered confirmations merge
/// idempotently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillReport {
    pub order_id: OrderId,
    /// Total quantity filled so far for the order
    pub cumulative_quantity: Decimal,
    pub fill_price: Decimal,
    /// Commission for the whole cumulative fill
    pub commission: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// A market order derived from an accepted signal
///
/// Owned exclusively by the executor; all mutation goes through the
/// transition methods below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub strategy_id: Uuid,
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    pub average_fill_price: Option<Decimal>,
    pub commission: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending market order
    pub fn market(
        strategy_id: Uuid,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            order_id: Uuid::new_v4(),
            strategy_id,
            symbol: symbol.into(),
            order_type: OrderType::Market,
            side,
            quantity,
            price: Some(price),
            stop_price: None,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            average_fill_price: None,
            commission: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, next: OrderStatus) -> Result<(), EngineError> {
        if !self.status.can_transition_to(next) {
            return Err(EngineError::InvalidOrderTransition {
                from: format!("{:?}", self.status),
                to: format!("{next:?}"),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the order handed to the execution collaborator
    pub fn submit(&mut self) -> Result<(), EngineError> {
        self.transition(OrderStatus::Submitted)
    }

    /// Merge a fill confirmation
    ///
    /// Idempotent: confirmations whose cumulative quantity does not advance
    /// the order are ignored, including re-deliveries after FILLED.
    pub fn apply_fill(&mut self, fill: &FillReport) -> Result<(), EngineError> {
        if fill.order_id != self.order_id {
            return Err(EngineError::OrderSubmission(format!(
                "fill for order {} applied to order {}",
                fill.order_id, self.order_id
            )));
        }
        if fill.cumulative_quantity <= self.filled_quantity {
            return Ok(());
        }

        let filled = fill.cumulative_quantity.min(self.quantity);
        let next = if filled >= self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.transition(next)?;

        self.filled_quantity = filled;
        self.average_fill_price = Some(fill.fill_price);
        self.commission = fill.commission;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), EngineError> {
        self.transition(OrderStatus::Cancelled)
    }

    pub fn reject(&mut self) -> Result<(), EngineError> {
        self.transition(OrderStatus::Rejected)
    }

    pub fn expire(&mut self) -> Result<(), EngineError> {
        self.transition(OrderStatus::Expired)
    }

    /// Quantity still open
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }
}
