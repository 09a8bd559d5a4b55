//! End-to-end executor pipeline tests

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tradeloop::config::{BacktestConfig, Config, EngineConfig, RiskConfig};
use tradeloop::data::ReplaySource;
use tradeloop::execution::{OrderStatus, PaperEngine};
use tradeloop::executor::StrategyExecutor;
use tradeloop::market::{PriceBar, PriceSeries};
use tradeloop::notify::LogNotifier;
use tradeloop::persistence::InMemoryStore;
use tradeloop::signal::{SignalDirection, TradingSignal};
use tradeloop::strategy::{StrategyKind, StrategyParams};
use uuid::Uuid;

fn rising_series(n: usize) -> PriceSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = dec!(45000) + Decimal::from(i as u32 * 100);
            PriceBar {
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: dec!(10),
            }
        })
        .collect();
    PriceSeries::new("BTCUSDT", bars)
}

fn executor(store: Arc<InMemoryStore>) -> StrategyExecutor {
    StrategyExecutor::new(
        EngineConfig::default(),
        RiskConfig::default(),
        BacktestConfig::default(),
        Arc::new(ReplaySource::new(rising_series(60))),
        Arc::new(PaperEngine::new(dec!(0.001))),
        store,
        Arc::new(LogNotifier),
    )
}

fn buy_signal(strategy_id: Uuid, price: Decimal) -> TradingSignal {
    TradingSignal::new(
        strategy_id,
        "BTCUSDT",
        SignalDirection::Buy,
        0.8,
        0.7,
        price,
        Some(price * dec!(0.95)),
        Some(price * dec!(1.10)),
    )
}

fn close_signal(strategy_id: Uuid, price: Decimal) -> TradingSignal {
    TradingSignal::new(
        strategy_id,
        "BTCUSDT",
        SignalDirection::Close,
        1.0,
        1.0,
        price,
        None,
        None,
    )
}

#[tokio::test]
async fn test_signal_to_fill_pipeline_persists_state() {
    let store = Arc::new(InMemoryStore::new());
    let executor = executor(store.clone());

    let id = executor
        .register_strategy(
            StrategyKind::Momentum,
            "BTCUSDT",
            StrategyParams::new(),
            "alpha",
        )
        .await
        .unwrap();

    let order = executor
        .execute_signal(&buy_signal(id, dec!(45000)), "alpha")
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Filled);

    // Both the order and the updated execution reached the store
    let saved = store.order(order.order_id).await.unwrap();
    assert_eq!(saved.status, OrderStatus::Filled);
    let executions = {
        use tradeloop::persistence::ExecutionStore;
        store.load_executions().await.unwrap()
    };
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].total_signals, 1);
    assert_eq!(executions[0].filled_orders, 1);
}

#[tokio::test]
async fn test_profitable_round_trip_updates_performance() {
    let store = Arc::new(InMemoryStore::new());
    let executor = executor(store);

    let id = executor
        .register_strategy(
            StrategyKind::Momentum,
            "BTCUSDT",
            StrategyParams::new(),
            "alpha",
        )
        .await
        .unwrap();

    executor
        .execute_signal(&buy_signal(id, dec!(45000)), "alpha")
        .await
        .unwrap();
    executor
        .execute_signal(&close_signal(id, dec!(47000)), "alpha")
        .await
        .unwrap();

    let perf = executor.get_performance(id).await.unwrap();
    assert_eq!(perf.total_signals, 2);
    assert_eq!(perf.success_rate, 1.0);
    assert!(perf.total_pnl > Decimal::ZERO);
    assert!(perf.net_pnl < perf.total_pnl);
    assert_eq!(perf.win_rate, 1.0);
}

#[tokio::test]
async fn test_funds_are_isolated() {
    let store = Arc::new(InMemoryStore::new());
    let executor = executor(store);

    let alpha = executor
        .register_strategy(
            StrategyKind::Momentum,
            "BTCUSDT",
            StrategyParams::new(),
            "alpha",
        )
        .await
        .unwrap();
    let beta = executor
        .register_strategy(
            StrategyKind::MeanReversion,
            "BTCUSDT",
            StrategyParams::new(),
            "beta",
        )
        .await
        .unwrap();

    executor
        .execute_signal(&buy_signal(alpha, dec!(45000)), "alpha")
        .await
        .unwrap();

    // Beta's fund holds nothing, so its exit is rejected even though
    // alpha's fund has an open position in the same symbol
    let err = executor
        .execute_signal(&close_signal(beta, dec!(45000)), "beta")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no open"));

    let alpha_perf = executor.get_performance(alpha).await.unwrap();
    let beta_perf = executor.get_performance(beta).await.unwrap();
    assert_eq!(alpha_perf.success_rate, 1.0);
    assert_eq!(beta_perf.success_rate, 0.0);
}

#[test]
fn test_example_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example");
    let config = Config::load(path).unwrap();

    assert_eq!(config.strategy.len(), 2);
    assert_eq!(config.strategy[0].kind, "momentum");
    assert_eq!(config.engine.history_window, 100);
    assert_eq!(config.risk.max_total_risk, dec!(0.10));
    assert!(config.data.bars_path.is_some());
}
