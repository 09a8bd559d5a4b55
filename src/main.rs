use clap::Parser;
use tradeloop::cli::{Cli, Commands};
use tradeloop::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    tradeloop::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting paper trading mode");
            args.execute(&config).await?;
        }
        Commands::Backtest(args) => {
            tracing::info!("Starting backtest");
            args.execute(&config).await?;
        }
        Commands::Status => {
            println!("tradeloop status");
            println!("  Mode: {:?}", config.execution.mode);
            println!("  Status: Not running");
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Engine: interval={}s capital={} window={}",
                config.engine.evaluation_interval_secs,
                config.engine.initial_capital,
                config.engine.history_window
            );
            for strategy in &config.strategy {
                println!(
                    "  Strategy: {} {} fund={}",
                    strategy.kind, strategy.symbol, strategy.fund_id
                );
            }
            println!(
                "  Risk: MaxTotal={}%, AssumedPerPosition={}%",
                config.risk.max_total_risk * rust_decimal_macros::dec!(100),
                config.risk.assumed_risk_fraction * rust_decimal_macros::dec!(100)
            );
            println!("  Execution: {:?}", config.execution.mode);
        }
    }

    Ok(())
}
