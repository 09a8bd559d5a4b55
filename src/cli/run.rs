//! Run command implementation

use crate::config::{Config, ExecutionMode};
use crate::data::{load_bars_csv, ReplaySource};
use crate::execution::PaperEngine;
use crate::executor::StrategyExecutor;
use crate::notify::LogNotifier;
use crate::persistence::InMemoryStore;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Bar CSV file, overrides the configured data path
    #[arg(long)]
    pub bars: Option<PathBuf>,

    /// Stop automatically after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        if config.execution.mode == ExecutionMode::Live {
            anyhow::bail!("live execution is not implemented; set execution.mode = \"paper\"");
        }
        if config.strategy.is_empty() {
            anyhow::bail!("no strategies configured; add at least one [[strategy]] section");
        }

        let bars_path = self
            .bars
            .clone()
            .or_else(|| config.data.bars_path.clone())
            .ok_or_else(|| anyhow::anyhow!("no bar file: pass --bars or set data.bars_path"))?;

        // Every configured strategy replays the same file, so they must
        // agree on the symbol
        let symbol = &config.strategy[0].symbol;
        if let Some(other) = config.strategy.iter().find(|s| &s.symbol != symbol) {
            anyhow::bail!(
                "all strategies must share one symbol per run, found {} and {}",
                symbol,
                other.symbol
            );
        }

        // Pace the replay off wall-clock cycles: every strategy loop in one
        // evaluation interval sees the same bar window
        let step = Duration::from_secs(config.engine.evaluation_interval_secs.max(1));
        let market = Arc::new(ReplaySource::paced(
            load_bars_csv(&bars_path, symbol)?,
            step,
        ));
        let executor = StrategyExecutor::new(
            config.engine.clone(),
            config.risk.clone(),
            config.backtest.clone(),
            market,
            Arc::new(PaperEngine::new(config.execution.commission_rate)),
            Arc::new(InMemoryStore::new()),
            Arc::new(LogNotifier),
        );

        let mut ids = vec![];
        for strategy in &config.strategy {
            let id = executor.register_from_config(strategy).await?;
            executor.start(id).await?;
            ids.push(id);
        }
        tracing::info!(strategies = ids.len(), "paper trading started");

        match self.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => {
                tokio::signal::ctrl_c().await?;
                tracing::info!("shutdown requested");
            }
        }

        executor.shutdown().await;

        for id in ids {
            let perf = executor.get_performance(id).await?;
            println!(
                "{}: {:?}  signals={}  success={:.0}%  net_pnl={:.2}  win_rate={:.0}%",
                id,
                perf.status,
                perf.total_signals,
                perf.success_rate * 100.0,
                perf.net_pnl,
                perf.win_rate * 100.0,
            );
        }

        Ok(())
    }
}
