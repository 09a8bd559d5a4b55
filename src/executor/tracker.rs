//! Per-strategy execution aggregate

use crate::backtest::metrics;
use crate::risk::ClosedTrade;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a registered strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Stopped,
    Active,
    /// Too many consecutive cycle failures; requires manual restart
    Error,
}

/// Running counters and metrics for one strategy instance
///
/// Mutated only by the owning strategy's loop and its `execute_signal`
/// calls; other strategies never touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyExecution {
    pub strategy_id: Uuid,
    pub fund_id: String,
    pub status: ExecutionStatus,

    pub total_signals: u64,
    pub successful_signals: u64,
    pub failed_signals: u64,
    pub total_orders: u64,
    pub filled_orders: u64,
    pub cancelled_orders: u64,

    pub total_pnl: Decimal,
    pub total_commission: Decimal,

    /// Worst equity decline from peak, in [0, 1]
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub win_rate: f64,

    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,

    initial_capital: Decimal,
    wins: u64,
    losses: u64,
    trade_returns: Vec<f64>,
    equity_peak: Decimal,
}

impl StrategyExecution {
    pub fn new(strategy_id: Uuid, fund_id: String) -> Self {
        Self {
            strategy_id,
            fund_id,
            status: ExecutionStatus::Stopped,
            total_signals: 0,
            successful_signals: 0,
            failed_signals: 0,
            total_orders: 0,
            filled_orders: 0,
            cancelled_orders: 0,
            total_pnl: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            win_rate: 0.0,
            start_time: None,
            end_time: None,
            initial_capital: Decimal::ZERO,
            wins: 0,
            losses: 0,
            trade_returns: vec![],
            equity_peak: Decimal::ZERO,
        }
    }

    pub fn with_initial_capital(mut self, capital: Decimal) -> Self {
        self.initial_capital = capital;
        self.equity_peak = capital;
        self
    }

    pub fn mark_active(&mut self) {
        self.status = ExecutionStatus::Active;
        self.start_time = Some(Utc::now());
        self.end_time = None;
    }

    pub fn mark_stopped(&mut self) {
        self.status = ExecutionStatus::Stopped;
        self.end_time = Some(Utc::now());
    }

    pub fn mark_error(&mut self) {
        self.status = ExecutionStatus::Error;
        self.end_time = Some(Utc::now());
    }

    /// Signal produced an order
    pub fn record_signal_success(&mut self) {
        self.total_signals += 1;
        self.successful_signals += 1;
    }

    /// Signal rejected at any pipeline stage
    pub fn record_signal_failure(&mut self) {
        self.total_signals += 1;
        self.failed_signals += 1;
    }

    pub fn record_order_created(&mut self) {
        self.total_orders += 1;
    }

    pub fn record_order_filled(&mut self, commission: Decimal) {
        self.filled_orders += 1;
        self.total_commission += commission;
    }

    pub fn record_order_cancelled(&mut self) {
        self.cancelled_orders += 1;
    }

    /// Fold a realized trade into PnL, win rate, Sharpe, and drawdown
    pub fn record_closed_trade(&mut self, trade: &ClosedTrade) {
        self.total_pnl += trade.pnl;
        if trade.pnl > Decimal::ZERO {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        let settled = self.wins + self.losses;
        if settled > 0 {
            self.win_rate = self.wins as f64 / settled as f64;
        }

        self.trade_returns.push(trade.trade_return());
        self.sharpe_ratio = metrics::sharpe_ratio(&self.trade_returns, 252.0);

        let equity = self.initial_capital + self.total_pnl - self.total_commission;
        if equity > self.equity_peak {
            self.equity_peak = equity;
        }
        if self.equity_peak > Decimal::ZERO {
            let dd = ((self.equity_peak - equity) / self.equity_peak)
                .to_f64()
                .unwrap_or(0.0)
                .clamp(0.0, 1.0);
            if dd > self.max_drawdown {
                self.max_drawdown = dd;
            }
        }
    }

    /// PnL net of commission
    pub fn net_pnl(&self) -> Decimal {
        self.total_pnl - self.total_commission
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_signals == 0 {
            return 0.0;
        }
        self.successful_signals as f64 / self.total_signals as f64
    }

    pub fn fill_rate(&self) -> f64 {
        if self.total_orders == 0 {
            return 0.0;
        }
        self.filled_orders as f64 / self.total_orders as f64
    }
}

/// Read-only performance view returned by the executor
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSnapshot {
    pub strategy_id: Uuid,
    pub status: ExecutionStatus,
    pub total_signals: u64,
    pub success_rate: f64,
    pub fill_rate: f64,
    pub total_pnl: Decimal,
    pub total_commission: Decimal,
    pub net_pnl: Decimal,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub active_orders: usize,
}
