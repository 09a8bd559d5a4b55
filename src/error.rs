//! Engine error types

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the strategy engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("strategy not found: {0}")]
    StrategyNotFound(Uuid),

    #[error("signal validation failed: {0}")]
    Validation(String),

    #[error("risk limit exceeded: total risk {total_risk} > max {max_total_risk}")]
    RiskLimitExceeded {
        total_risk: Decimal,
        max_total_risk: Decimal,
    },

    #[error("order submission failed: {0}")]
    OrderSubmission(String),

    #[error("strategy runtime error: {0}")]
    StrategyRuntime(String),

    #[error("invalid order transition: {from} -> {to}")]
    InvalidOrderTransition { from: String, to: String },
}

impl EngineError {
    /// True for errors the operator must fix in config before retrying
    pub fn is_configuration(&self) -> bool {
        matches!(self, EngineError::Configuration(_))
    }
}
