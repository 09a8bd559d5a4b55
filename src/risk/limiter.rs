//! Aggregate risk limiter

use super::Position;
use crate::config::RiskConfig;
use crate::error::EngineError;
use crate::signal::TradingSignal;
use rust_decimal::Decimal;

/// Fund-level risk gate
///
/// Pure function of its inputs; the caller hands it a consistent snapshot of
/// positions so the check never races position updates.
pub struct RiskLimiter;

impl RiskLimiter {
    /// Accept or reject a sized signal against the fund's risk budget
    pub fn check(
        signal: &TradingSignal,
        quantity: Decimal,
        positions: &[Position],
        portfolio_value: Decimal,
        limits: &RiskConfig,
    ) -> Result<(), EngineError> {
        if portfolio_value <= Decimal::ZERO {
            return Err(EngineError::RiskLimitExceeded {
                total_risk: Decimal::ZERO,
                max_total_risk: limits.max_total_risk,
            });
        }

        let signal_risk = quantity * signal.price * limits.assumed_risk_fraction;
        let open_risk: Decimal = positions.iter().map(|p| p.risk).sum();
        let total_risk = open_risk + signal_risk;

        if total_risk / portfolio_value > limits.max_total_risk {
            return Err(EngineError::RiskLimitExceeded {
                total_risk: total_risk / portfolio_value,
                max_total_risk: limits.max_total_risk,
            });
        }

        Ok(())
    }
}
