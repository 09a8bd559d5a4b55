//! Backtest command implementation

use crate::backtest::BacktestEngine;
use crate::config::Config;
use crate::data;
use crate::strategy::{build_strategy, StrategyKind, StrategyParams};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Bar CSV file, overrides the configured data path
    #[arg(long)]
    pub bars: Option<PathBuf>,

    /// Initial capital, overrides engine.initial_capital
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Output format: json or table
    #[arg(long, default_value = "table")]
    pub format: String,
}

impl BacktestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if config.strategy.is_empty() {
            anyhow::bail!("no strategies configured; add at least one [[strategy]] section");
        }

        let bars_path = self
            .bars
            .clone()
            .or_else(|| config.data.bars_path.clone())
            .ok_or_else(|| anyhow::anyhow!("no bar file: pass --bars or set data.bars_path"))?;

        let capital = self.capital.unwrap_or(config.engine.initial_capital);
        let engine = BacktestEngine::new(config.backtest.clone());

        for entry in &config.strategy {
            let kind = StrategyKind::from_str(&entry.kind)?;
            let params: StrategyParams = entry.params.clone().into();
            let strategy = build_strategy(kind, &entry.symbol, params)?;

            let series = data::load_bars_csv(&bars_path, &entry.symbol)?;
            let report = engine.run(strategy.as_ref(), &series, capital);

            match self.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                _ => {
                    println!("{} {} ({} bars)", entry.kind, entry.symbol, series.len());
                    println!("{}", report.format_table());
                }
            }
        }

        Ok(())
    }
}
