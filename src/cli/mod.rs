//! CLI interface for tradeloop
//!
//! Provides subcommands for:
//! - `run`: Replay a bar file through the live executor in paper mode
//! - `backtest`: Run a backtest on a bar file
//! - `status`: Show current state
//! - `config`: Show configuration

mod backtest;
mod run;

pub use backtest::BacktestArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tradeloop")]
#[command(about = "Trading strategy execution and backtesting engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run configured strategies in paper mode
    Run(RunArgs),
    /// Run a backtest on historical bars
    Backtest(BacktestArgs),
    /// Show current state
    Status,
    /// Show configuration
    Config,
}
