//! Signal types

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Proposed trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
    Hold,
    Close,
}

impl SignalDirection {
    /// Whether the signal proposes opening or adding to a position
    pub fn is_entry(&self) -> bool {
        matches!(self, Self::Buy)
    }

    /// Whether the signal proposes reducing or closing a position
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Sell | Self::Close)
    }
}

/// A strategy's proposed trade before sizing and risk checks
///
/// Never mutated after creation; `strength` and `confidence` are clamped to
/// `[0, 1]` at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    /// Unique signal identifier
    pub signal_id: Uuid,
    /// Strategy that produced the signal
    pub strategy_id: Uuid,
    /// Instrument symbol
    pub symbol: String,
    /// Trade direction
    pub direction: SignalDirection,
    /// Signal strength in [0, 1]
    pub strength: f64,
    /// Confidence score in [0, 1]
    pub confidence: f64,
    /// Reference price at signal time
    pub price: Decimal,
    /// Proposed quantity (0 until sized by the executor)
    pub quantity: Decimal,
    /// Optional protective stop price
    pub stop_loss: Option<Decimal>,
    /// Optional profit target price
    pub take_profit: Option<Decimal>,
    /// Strategy-specific annotations
    pub metadata: Value,
    /// Signal generation timestamp
    pub created_at: DateTime<Utc>,
}

impl TradingSignal {
    /// Create a new signal, clamping strength and confidence into range
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        strategy_id: Uuid,
        symbol: impl Into<String>,
        direction: SignalDirection,
        strength: f64,
        confidence: f64,
        price: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    ) -> Self {
        Self {
            signal_id: Uuid::new_v4(),
            strategy_id,
            symbol: symbol.into(),
            direction,
            strength: strength.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            price,
            quantity: Decimal::ZERO,
            stop_loss,
            take_profit,
            metadata: Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Attach strategy-specific metadata
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check the signal invariants
    ///
    /// Strategies clamp at construction, but signals can arrive from outside
    /// the crate (deserialized, hand-built in tests), so the executor
    /// re-validates before acting on one.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.strength) || !self.strength.is_finite() {
            return Err(EngineError::Validation(format!(
                "strength {} out of [0, 1]",
                self.strength
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) || !self.confidence.is_finite() {
            return Err(EngineError::Validation(format!(
                "confidence {} out of [0, 1]",
                self.confidence
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "non-positive price {}",
                self.price
            )));
        }
        if self.quantity < Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "negative quantity {}",
                self.quantity
            )));
        }
        if let Some(stop) = self.stop_loss {
            if stop <= Decimal::ZERO {
                return Err(EngineError::Validation(format!(
                    "non-positive stop loss {stop}"
                )));
            }
        }
        if let Some(target) = self.take_profit {
            if target <= Decimal::ZERO {
                return Err(EngineError::Validation(format!(
                    "non-positive take profit {target}"
                )));
            }
        }
        Ok(())
    }
}
