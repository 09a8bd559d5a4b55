//! Backtest engine
//!
//! Replays a historical series bar-by-bar through live strategy logic with
//! an in-memory ledger instead of order submission. Pure: no I/O, and
//! identical inputs produce identical trades and equity curve.

pub mod metrics;
mod report;

pub use report::{BacktestReport, BacktestTrade, EquityPoint};

use crate::config::BacktestConfig;
use crate::execution::OrderSide;
use crate::market::PriceSeries;
use crate::signal::SignalDirection;
use crate::strategy::Strategy;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Replays bars through a strategy and scores the result
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// Run the replay
    ///
    /// At each bar the strategy sees only bars up to and including the
    /// current one. BUY allocates a fixed fraction of current cash at the
    /// signal price; SELL and CLOSE liquidate the full position. Invalid
    /// bars are skipped, never fatal.
    pub fn run(
        &self,
        strategy: &dyn Strategy,
        series: &PriceSeries,
        initial_capital: Decimal,
    ) -> BacktestReport {
        let mut cash = initial_capital;
        let mut position_quantity = Decimal::ZERO;
        let mut entry_price = Decimal::ZERO;
        let mut trades: Vec<BacktestTrade> = vec![];
        let mut equity_curve: Vec<EquityPoint> = vec![];

        for idx in 0..series.len() {
            let bar = &series.bars()[idx];
            if !bar.is_valid() {
                tracing::debug!(symbol = %series.symbol, ?bar.timestamp, "skipping invalid bar");
                continue;
            }

            let visible = series.up_to(idx);
            let signals = match strategy.generate_signals(&visible) {
                Ok(signals) => signals,
                Err(error) => {
                    tracing::warn!(%error, "signal generation failed during replay, bar skipped");
                    vec![]
                }
            };

            for signal in &signals {
                if !strategy.validate_signal(signal) {
                    continue;
                }
                match signal.direction {
                    SignalDirection::Buy => {
                        let allocation = cash * self.config.allocation_fraction;
                        if signal.price <= Decimal::ZERO {
                            continue;
                        }
                        let quantity = allocation / signal.price;
                        if quantity <= Decimal::ZERO {
                            continue;
                        }
                        let commission =
                            quantity * signal.price * self.config.commission_rate;
                        let cost = quantity * signal.price + commission;
                        if cost > cash {
                            continue;
                        }

                        // Average into any existing position
                        let total = position_quantity + quantity;
                        entry_price = (position_quantity * entry_price
                            + quantity * signal.price)
                            / total;
                        position_quantity = total;
                        cash -= cost;

                        trades.push(BacktestTrade {
                            timestamp: bar.timestamp,
                            symbol: series.symbol.clone(),
                            side: OrderSide::Buy,
                            price: signal.price,
                            quantity,
                            commission,
                            pnl: None,
                        });
                    }
                    SignalDirection::Sell | SignalDirection::Close => {
                        if position_quantity <= Decimal::ZERO {
                            continue;
                        }
                        let proceeds = position_quantity * signal.price;
                        let commission = proceeds * self.config.commission_rate;
                        let pnl = (signal.price - entry_price) * position_quantity;
                        cash += proceeds - commission;

                        trades.push(BacktestTrade {
                            timestamp: bar.timestamp,
                            symbol: series.symbol.clone(),
                            side: OrderSide::Sell,
                            price: signal.price,
                            quantity: position_quantity,
                            commission,
                            pnl: Some(pnl),
                        });

                        position_quantity = Decimal::ZERO;
                        entry_price = Decimal::ZERO;
                    }
                    SignalDirection::Hold => {}
                }
            }

            // Mark-to-market at this bar's close
            let equity = cash + position_quantity * bar.close;
            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity,
            });
        }

        let final_capital = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > Decimal::ZERO {
            ((final_capital - initial_capital) / initial_capital)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let equity_values: Vec<Decimal> = equity_curve.iter().map(|p| p.equity).collect();
        let returns = metrics::step_returns(&equity_values);

        BacktestReport {
            initial_capital,
            final_capital,
            total_return,
            sharpe_ratio: metrics::sharpe_ratio(&returns, self.config.periods_per_year),
            max_drawdown: metrics::max_drawdown(&equity_values),
            trades,
            equity_curve,
        }
    }
}
