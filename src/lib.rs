//! tradeloop: Trading strategy execution and backtesting engine
//!
//! This library provides the core components for:
//! - Normalized OHLCV market data with a pluggable source boundary
//! - Momentum and mean-reversion strategy variants
//! - Signal validation, position sizing, and fund-level risk limits
//! - Order lifecycle with an instant-fill paper engine
//! - A per-strategy executor with independent evaluation loops
//! - Deterministic bar-by-bar backtesting with Sharpe and drawdown
//! - CSV bar loading and file-backed replay
//! - Full observability stack

pub mod backtest;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod execution;
pub mod executor;
pub mod market;
pub mod notify;
pub mod persistence;
pub mod risk;
pub mod signal;
pub mod strategy;
pub mod telemetry;
