//! Strategy variants
//!
//! A strategy turns a price-history snapshot into signals, sizes accepted
//! signals, and reports window risk metrics. Adding a variant means adding a
//! module here; the executor never changes.

mod mean_reversion;
mod momentum;
mod params;

pub use mean_reversion::MeanReversionStrategy;
pub use momentum::MomentumStrategy;
pub use params::StrategyParams;

use crate::error::EngineError;
use crate::market::PriceSeries;
use crate::signal::TradingSignal;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of strategy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Momentum,
    MeanReversion,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Momentum => "momentum",
            Self::MeanReversion => "mean_reversion",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "momentum" => Ok(Self::Momentum),
            "mean_reversion" | "mean-reversion" => Ok(Self::MeanReversion),
            other => Err(EngineError::Configuration(format!(
                "unknown strategy type '{other}'"
            ))),
        }
    }
}

/// Risk metrics derived from a trailing window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Per-bar return volatility (standard deviation)
    pub volatility: f64,
    /// Mean per-bar return over the window
    pub mean_return: f64,
    /// Bars that contributed to the estimate
    pub sample_count: usize,
}

/// Trait for trading strategy implementations
pub trait Strategy: Send + Sync {
    fn id(&self) -> Uuid;
    fn kind(&self) -> StrategyKind;
    fn symbol(&self) -> &str;
    fn params(&self) -> &StrategyParams;

    /// Replace parameters, rejecting malformed values
    ///
    /// Never called concurrently with `generate_signals` for the same
    /// strategy; the executor serializes both behind the strategy lock.
    fn update_params(&mut self, params: StrategyParams) -> Result<(), EngineError>;

    /// Deterministic function of the trailing bar window
    fn generate_signals(&self, history: &PriceSeries) -> Result<Vec<TradingSignal>, EngineError>;

    /// Quantity for an accepted signal; 0 on any computation failure
    fn size_position(&self, signal: &TradingSignal, portfolio_value: Decimal) -> Decimal;

    /// Window volatility estimate used for reporting
    fn risk_metrics(&self, history: &PriceSeries) -> RiskMetrics;

    /// Reject signals with out-of-range fields
    fn validate_signal(&self, signal: &TradingSignal) -> bool {
        signal.validate().is_ok()
    }
}

/// Instantiate the named strategy variant
pub fn build_strategy(
    kind: StrategyKind,
    symbol: impl Into<String>,
    params: StrategyParams,
) -> Result<Box<dyn Strategy>, EngineError> {
    match kind {
        StrategyKind::Momentum => Ok(Box::new(MomentumStrategy::new(symbol, params)?)),
        StrategyKind::MeanReversion => Ok(Box::new(MeanReversionStrategy::new(symbol, params)?)),
    }
}

/// Lossless-enough f64 to Decimal conversion for parameter-derived factors
pub(crate) fn to_decimal(value: f64) -> Option<Decimal> {
    use rust_decimal::prelude::FromPrimitive;
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
}

/// Per-bar simple returns from a window of closes
pub(crate) fn bar_returns(closes: &[Decimal]) -> Vec<f64> {
    use rust_decimal::prelude::ToPrimitive;

    closes
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].to_f64()?;
            let curr = pair[1].to_f64()?;
            if prev == 0.0 {
                return None;
            }
            Some((curr - prev) / prev)
        })
        .collect()
}

/// Risk metrics over the trailing `window` closes of a series
pub(crate) fn window_risk_metrics(history: &PriceSeries, window: usize) -> RiskMetrics {
    let returns = bar_returns(&history.trailing_closes(window));
    if returns.is_empty() {
        return RiskMetrics::default();
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    RiskMetrics {
        volatility: variance.sqrt(),
        mean_return: mean,
        sample_count: returns.len(),
    }
}
