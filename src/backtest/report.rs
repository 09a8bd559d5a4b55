//! Backtest result types and reporting

use crate::execution::OrderSide;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One simulated fill recorded during replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: Decimal,
    pub commission: Decimal,
    /// Realized PnL, present on liquidations
    pub pnl: Option<Decimal>,
}

/// Mark-to-market equity after one bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: Decimal,
}

/// Complete backtest results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    /// (final - initial) / initial
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub trades: Vec<BacktestTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestReport {
    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        format!(
            r#"
══════════════════════════════════════════════════════
               BACKTEST RESULTS
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Initial Capital:  {:.2}
Final Capital:    {:.2}
Total Return:     {:+.2}%
Sharpe Ratio:     {:.2}
Max Drawdown:     {:.2}%

ACTIVITY
───────────────────────────────────────────────────────
Total Trades:     {}
Equity Points:    {}
══════════════════════════════════════════════════════
"#,
            self.initial_capital,
            self.final_capital,
            self.total_return * 100.0,
            self.sharpe_ratio,
            self.max_drawdown * 100.0,
            self.trades.len(),
            self.equity_curve.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_table() {
        let report = BacktestReport {
            initial_capital: dec!(100000),
            final_capital: dec!(105000),
            total_return: 0.05,
            sharpe_ratio: 1.25,
            max_drawdown: 0.08,
            trades: vec![],
            equity_curve: vec![],
        };

        let table = report.format_table();
        assert!(table.contains("BACKTEST RESULTS"));
        assert!(table.contains("+5.00%"));
        assert!(table.contains("1.25"));
        assert!(table.contains("8.00%"));
    }
}
