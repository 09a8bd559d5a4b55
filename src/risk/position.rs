//! Per-fund position book

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One open position in a fund
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    /// Volume-weighted average entry price
    pub entry_price: Decimal,
    /// Risk attributed to the position when it was opened
    pub risk: Decimal,
}

impl Position {
    /// Current notional at entry prices
    pub fn notional(&self) -> Decimal {
        self.quantity * self.entry_price
    }
}

/// A fully closed position with realized outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    /// Realized PnL before commission
    pub pnl: Decimal,
}

impl ClosedTrade {
    /// Realized return relative to entry notional, as a ratio
    pub fn trade_return(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        let entry_notional = self.quantity * self.entry_price;
        if entry_notional <= Decimal::ZERO {
            return 0.0;
        }
        (self.pnl / entry_notional).to_f64().unwrap_or(0.0)
    }
}

/// Open positions for one fund, updated atomically per order fill
#[derive(Debug, Default)]
pub struct PositionBook {
    positions: HashMap<String, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filled buy, averaging into any existing position
    pub fn apply_buy(&mut self, symbol: &str, quantity: Decimal, price: Decimal, risk: Decimal) {
        if quantity <= Decimal::ZERO {
            return;
        }
        match self.positions.get_mut(symbol) {
            Some(position) => {
                let total_quantity = position.quantity + quantity;
                position.entry_price =
                    (position.notional() + quantity * price) / total_quantity;
                position.quantity = total_quantity;
                position.risk += risk;
            }
            None => {
                self.positions.insert(
                    symbol.to_string(),
                    Position {
                        symbol: symbol.to_string(),
                        quantity,
                        entry_price: price,
                        risk,
                    },
                );
            }
        }
    }

    /// Liquidate the full position at `exit_price`
    pub fn liquidate(&mut self, symbol: &str, exit_price: Decimal) -> Option<ClosedTrade> {
        let position = self.positions.remove(symbol)?;
        let pnl = (exit_price - position.entry_price) * position.quantity;
        Some(ClosedTrade {
            symbol: position.symbol,
            quantity: position.quantity,
            entry_price: position.entry_price,
            exit_price,
            pnl,
        })
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Snapshot of open positions for a risk check
    pub fn snapshot(&self) -> Vec<Position> {
        self.positions.values().cloned().collect()
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    /// Mark-to-market value of all open positions at given prices
    pub fn market_value(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        self.positions
            .values()
            .map(|p| {
                let mark = prices.get(&p.symbol).copied().unwrap_or(p.entry_price);
                p.quantity * mark
            })
            .sum()
    }
}
