//! Strategy executor
//!
//! Owns the set of registered strategies, drives one evaluation loop per
//! ACTIVE strategy, and funnels every signal through the
//! validate → size → risk-check → submit pipeline. All steady-state errors
//! are absorbed into the per-strategy execution record; only
//! registration-time errors reach the caller.

mod tracker;

pub use tracker::{ExecutionStatus, PerformanceSnapshot, StrategyExecution};

use crate::backtest::{BacktestEngine, BacktestReport};
use crate::config::{BacktestConfig, EngineConfig, RiskConfig, StrategyConfig};
use crate::error::EngineError;
use crate::execution::{ExecutionEngine, Order, OrderId, OrderSide};
use crate::market::{MarketDataSource, PriceSeries};
use crate::notify::{NotificationKind, NotificationPriority, Notifier};
use crate::persistence::ExecutionStore;
use crate::risk::{PositionBook, RiskLimiter};
use crate::signal::{SignalDirection, TradingSignal};
use crate::strategy::{build_strategy, Strategy, StrategyKind, StrategyParams};
use crate::telemetry;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Consecutive failed cycles before a strategy is moved to ERROR
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

struct LoopHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct StrategyRuntime {
    fund_id: String,
    symbol: String,
    strategy: Mutex<Box<dyn Strategy>>,
    execution: Mutex<StrategyExecution>,
    control: Mutex<Option<LoopHandle>>,
}

/// Cash and open positions for one fund
#[derive(Default)]
struct FundState {
    book: PositionBook,
    realized_pnl: Decimal,
}

struct Inner {
    config: EngineConfig,
    backtest: BacktestConfig,
    limits: RwLock<RiskConfig>,
    market: Arc<dyn MarketDataSource>,
    engine: Arc<dyn ExecutionEngine>,
    store: Arc<dyn ExecutionStore>,
    notifier: Arc<dyn Notifier>,
    strategies: RwLock<HashMap<Uuid, Arc<StrategyRuntime>>>,
    funds: RwLock<HashMap<String, FundState>>,
    orders: RwLock<HashMap<OrderId, Order>>,
}

/// The orchestrator
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct StrategyExecutor {
    inner: Arc<Inner>,
}

impl StrategyExecutor {
    pub fn new(
        config: EngineConfig,
        limits: RiskConfig,
        backtest: BacktestConfig,
        market: Arc<dyn MarketDataSource>,
        engine: Arc<dyn ExecutionEngine>,
        store: Arc<dyn ExecutionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                backtest,
                limits: RwLock::new(limits),
                market,
                engine,
                store,
                notifier,
                strategies: RwLock::new(HashMap::new()),
                funds: RwLock::new(HashMap::new()),
                orders: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Instantiate and register a strategy, paired with a STOPPED execution
    pub async fn register_strategy(
        &self,
        kind: StrategyKind,
        symbol: &str,
        params: StrategyParams,
        fund_id: &str,
    ) -> Result<Uuid, EngineError> {
        let strategy = build_strategy(kind, symbol, params)?;
        let strategy_id = strategy.id();

        let execution = StrategyExecution::new(strategy_id, fund_id.to_string())
            .with_initial_capital(self.inner.config.initial_capital);

        let runtime = Arc::new(StrategyRuntime {
            fund_id: fund_id.to_string(),
            symbol: symbol.to_string(),
            strategy: Mutex::new(strategy),
            execution: Mutex::new(execution),
            control: Mutex::new(None),
        });

        self.inner
            .strategies
            .write()
            .await
            .insert(strategy_id, runtime.clone());
        self.inner
            .funds
            .write()
            .await
            .entry(fund_id.to_string())
            .or_default();

        self.persist_execution(&runtime).await;
        tracing::info!(%strategy_id, kind = kind.as_str(), symbol, fund_id, "strategy registered");
        Ok(strategy_id)
    }

    /// Register from a configuration entry
    pub async fn register_from_config(
        &self,
        config: &StrategyConfig,
    ) -> Result<Uuid, EngineError> {
        let kind = StrategyKind::from_str(&config.kind)?;
        let params: StrategyParams = config.params.clone().into();
        self.register_strategy(kind, &config.symbol, params, &config.fund_id)
            .await
    }

    /// Start the evaluation loop for a strategy
    pub async fn start(&self, strategy_id: Uuid) -> Result<(), EngineError> {
        let runtime = self.runtime(strategy_id).await?;
        let mut control = runtime.control.lock().await;
        // A loop that halted itself leaves a finished handle behind
        if control.as_ref().is_some_and(|h| !h.task.is_finished()) {
            return Ok(());
        }

        {
            runtime.execution.lock().await.mark_active();
        }
        self.persist_execution(&runtime).await;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(Self::run_loop(self.clone(), runtime.clone(), cancel_rx));
        *control = Some(LoopHandle {
            cancel: cancel_tx,
            task,
        });

        tracing::info!(%strategy_id, "strategy started");
        Ok(())
    }

    /// Request cooperative stop and wait for the loop to exit
    ///
    /// An in-flight cycle completes; the loop observes the request at the
    /// top of its next iteration.
    pub async fn stop(&self, strategy_id: Uuid) -> Result<(), EngineError> {
        let runtime = self.runtime(strategy_id).await?;
        let handle = runtime.control.lock().await.take();

        if let Some(handle) = handle {
            let _ = handle.cancel.send(true);
            if let Err(error) = handle.task.await {
                tracing::warn!(%strategy_id, %error, "evaluation loop panicked");
            }
        }

        {
            runtime.execution.lock().await.mark_stopped();
        }
        self.persist_execution(&runtime).await;
        tracing::info!(%strategy_id, "strategy stopped");
        Ok(())
    }

    /// Stop every running strategy
    pub async fn shutdown(&self) {
        let ids: Vec<Uuid> = self.inner.strategies.read().await.keys().copied().collect();
        for id in ids {
            if let Err(error) = self.stop(id).await {
                tracing::warn!(strategy_id = %id, %error, "failed to stop strategy");
            }
        }
    }

    /// Replace a strategy's parameters between cycles
    pub async fn update_strategy_params(
        &self,
        strategy_id: Uuid,
        params: StrategyParams,
    ) -> Result<(), EngineError> {
        let runtime = self.runtime(strategy_id).await?;
        let mut strategy = runtime.strategy.lock().await;
        strategy.update_params(params)
    }

    /// Swap in new fund-level risk limits; takes effect next cycle
    pub async fn set_risk_limits(&self, limits: RiskConfig) {
        *self.inner.limits.write().await = limits;
    }

    /// Run one signal through the full pipeline
    ///
    /// Increments `total_signals` exactly once per call and exactly one of
    /// `successful_signals` / `failed_signals`.
    pub async fn execute_signal(
        &self,
        signal: &TradingSignal,
        fund_id: &str,
    ) -> Result<Order, EngineError> {
        let runtime = self.runtime(signal.strategy_id).await?;
        let result = self.process_signal(&runtime, signal, fund_id).await;

        {
            let mut execution = runtime.execution.lock().await;
            match &result {
                Ok(_) => execution.record_signal_success(),
                Err(error) => {
                    tracing::debug!(signal_id = %signal.signal_id, %error, "signal rejected");
                    execution.record_signal_failure();
                }
            }
        }
        telemetry::record_signal(result.is_ok());
        self.persist_execution(&runtime).await;
        result
    }

    /// Cancel an order that has not reached a terminal state
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), EngineError> {
        // Validate up front so a bogus id never reaches the engine
        {
            let orders = self.inner.orders.read().await;
            let order = orders
                .get(&order_id)
                .ok_or_else(|| EngineError::Validation(format!("unknown order {order_id}")))?;
            if order.status.is_terminal() {
                return Err(EngineError::InvalidOrderTransition {
                    from: format!("{:?}", order.status),
                    to: "Cancelled".to_string(),
                });
            }
        }

        self.inner
            .engine
            .cancel_order(order_id)
            .await
            .map_err(|error| EngineError::OrderSubmission(error.to_string()))?;

        let order = {
            let mut orders = self.inner.orders.write().await;
            let order = orders
                .get_mut(&order_id)
                .ok_or_else(|| EngineError::Validation(format!("unknown order {order_id}")))?;
            order.cancel()?;
            order.clone()
        };
        if let Err(error) = self.inner.store.save_order(&order).await {
            tracing::warn!(%error, "failed to persist order");
        }

        if let Ok(runtime) = self.runtime(order.strategy_id).await {
            runtime.execution.lock().await.record_order_cancelled();
            self.persist_execution(&runtime).await;
        }
        tracing::info!(%order_id, "order cancelled");
        Ok(())
    }

    /// Read-only performance view; never mutates state
    pub async fn get_performance(
        &self,
        strategy_id: Uuid,
    ) -> Result<PerformanceSnapshot, EngineError> {
        let runtime = self.runtime(strategy_id).await?;
        let execution = runtime.execution.lock().await;

        let active_orders = self
            .inner
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.strategy_id == strategy_id && o.status.is_active())
            .count();

        Ok(PerformanceSnapshot {
            strategy_id,
            status: execution.status,
            total_signals: execution.total_signals,
            success_rate: execution.success_rate(),
            fill_rate: execution.fill_rate(),
            total_pnl: execution.total_pnl,
            total_commission: execution.total_commission,
            net_pnl: execution.net_pnl(),
            sharpe_ratio: execution.sharpe_ratio,
            max_drawdown: execution.max_drawdown,
            win_rate: execution.win_rate,
            active_orders,
        })
    }

    /// Replay a historical series through the registered strategy
    ///
    /// Pure with respect to executor state: no orders, no counters.
    pub async fn backtest(
        &self,
        strategy_id: Uuid,
        series: &PriceSeries,
        initial_capital: Decimal,
    ) -> Result<BacktestReport, EngineError> {
        let runtime = self.runtime(strategy_id).await?;
        let strategy = runtime.strategy.lock().await;
        let engine = BacktestEngine::new(self.inner.backtest.clone());
        Ok(engine.run(strategy.as_ref(), series, initial_capital))
    }

    async fn runtime(&self, strategy_id: Uuid) -> Result<Arc<StrategyRuntime>, EngineError> {
        self.inner
            .strategies
            .read()
            .await
            .get(&strategy_id)
            .cloned()
            .ok_or(EngineError::StrategyNotFound(strategy_id))
    }

    async fn process_signal(
        &self,
        runtime: &StrategyRuntime,
        signal: &TradingSignal,
        fund_id: &str,
    ) -> Result<Order, EngineError> {
        let limits = self.inner.limits.read().await.clone();

        let quantity = {
            let strategy = runtime.strategy.lock().await;
            if !strategy.validate_signal(signal) {
                return Err(EngineError::Validation(format!(
                    "signal {} failed validation",
                    signal.signal_id
                )));
            }
            if signal.direction == SignalDirection::Hold {
                return Err(EngineError::Validation(
                    "hold signal produces no order".to_string(),
                ));
            }

            // Consistent snapshot of the fund for sizing and the risk check
            let (portfolio_value, positions, held_quantity) = {
                let funds = self.inner.funds.read().await;
                match funds.get(fund_id) {
                    Some(fund) => (
                        self.inner.config.initial_capital + fund.realized_pnl,
                        fund.book.snapshot(),
                        fund.book.get(&signal.symbol).map(|p| p.quantity),
                    ),
                    None => (self.inner.config.initial_capital, vec![], None),
                }
            };

            // Exits liquidate whatever the fund holds; entries get sized
            let quantity = match (signal.direction.is_exit(), held_quantity) {
                (true, Some(held)) => held,
                (true, None) => {
                    return Err(EngineError::Validation(format!(
                        "no open {} position to exit",
                        signal.symbol
                    )));
                }
                (false, _) => strategy.size_position(signal, portfolio_value),
            };
            if quantity <= Decimal::ZERO {
                return Err(EngineError::Validation(format!(
                    "signal {} sized to zero quantity",
                    signal.signal_id
                )));
            }

            // Exits shed exposure; only entries are held against the limit
            if signal.direction.is_entry() {
                RiskLimiter::check(signal, quantity, &positions, portfolio_value, &limits)?;
            }
            quantity
        };

        let side = match signal.direction {
            SignalDirection::Buy => OrderSide::Buy,
            _ => OrderSide::Sell,
        };
        let mut order = Order::market(
            signal.strategy_id,
            &signal.symbol,
            side,
            quantity,
            signal.price,
        );
        {
            runtime.execution.lock().await.record_order_created();
        }
        order.submit()?;
        self.record_order(&order).await;

        let fill = match self.inner.engine.submit_order(&order).await {
            Ok(fill) => fill,
            Err(error) => {
                order.reject()?;
                self.record_order(&order).await;
                return Err(EngineError::OrderSubmission(error.to_string()));
            }
        };

        order.apply_fill(&fill)?;
        self.record_order(&order).await;
        {
            runtime
                .execution
                .lock()
                .await
                .record_order_filled(order.commission);
        }
        telemetry::record_order_filled();

        // Atomic per-fill position update
        let closed = {
            let mut funds = self.inner.funds.write().await;
            let fund = funds.entry(fund_id.to_string()).or_default();
            match side {
                OrderSide::Buy => {
                    let risk =
                        order.filled_quantity * fill.fill_price * limits.assumed_risk_fraction;
                    fund.book
                        .apply_buy(&order.symbol, order.filled_quantity, fill.fill_price, risk);
                    None
                }
                OrderSide::Sell => {
                    let trade = fund.book.liquidate(&order.symbol, fill.fill_price);
                    if let Some(trade) = &trade {
                        fund.realized_pnl += trade.pnl;
                    }
                    trade
                }
            }
        };

        if let Some(trade) = closed {
            let (net_pnl, max_drawdown) = {
                let mut execution = runtime.execution.lock().await;
                execution.record_closed_trade(&trade);
                (execution.net_pnl(), execution.max_drawdown)
            };
            telemetry::set_net_pnl(net_pnl);
            telemetry::set_max_drawdown(max_drawdown);
        }

        self.inner
            .notifier
            .notify(
                fund_id,
                "order filled",
                &format!(
                    "{} {} {} @ {}",
                    order.symbol, order.filled_quantity, order.order_id, fill.fill_price
                ),
                NotificationKind::OrderFilled,
                NotificationPriority::Normal,
            )
            .await;

        Ok(order)
    }

    /// One evaluation cycle: snapshot, generate, execute in order
    async fn run_cycle(&self, runtime: &Arc<StrategyRuntime>) -> Result<(), EngineError> {
        let series = self
            .inner
            .market
            .latest_bars(&runtime.symbol, self.inner.config.history_window)
            .await
            .map_err(|error| EngineError::StrategyRuntime(format!("market data: {error}")))?;

        let signals = {
            let strategy = runtime.strategy.lock().await;
            strategy.generate_signals(&series)?
        };

        // Per-signal failures are absorbed into counters; they do not fail
        // the cycle
        for signal in &signals {
            let _ = self.execute_signal(signal, &runtime.fund_id).await;
        }
        Ok(())
    }

    async fn run_loop(
        executor: StrategyExecutor,
        runtime: Arc<StrategyRuntime>,
        mut cancel: watch::Receiver<bool>,
    ) {
        let interval_secs = executor.inner.config.evaluation_interval_secs.max(1);
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut consecutive_failures = 0u32;

        loop {
            tokio::select! {
                _ = cancel.changed() => break,
                _ = ticker.tick() => {}
            }
            if *cancel.borrow() {
                break;
            }

            match executor.run_cycle(&runtime).await {
                Ok(()) => consecutive_failures = 0,
                Err(error) => {
                    consecutive_failures += 1;
                    tracing::warn!(
                        symbol = %runtime.symbol,
                        %error,
                        consecutive_failures,
                        "evaluation cycle failed"
                    );

                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        // Release the handle before flipping status so a
                        // caller that observes ERROR can start() immediately
                        runtime.control.lock().await.take();
                        {
                            runtime.execution.lock().await.mark_error();
                        }
                        executor.persist_execution(&runtime).await;
                        executor
                            .inner
                            .notifier
                            .notify(
                                &runtime.fund_id,
                                "strategy halted",
                                &format!(
                                    "{} halted after {consecutive_failures} consecutive failures",
                                    runtime.symbol
                                ),
                                NotificationKind::StrategyError,
                                NotificationPriority::High,
                            )
                            .await;
                        break;
                    }
                }
            }
        }
    }

    async fn persist_execution(&self, runtime: &StrategyRuntime) {
        let execution = runtime.execution.lock().await.clone();
        if let Err(error) = self.inner.store.save_execution(&execution).await {
            tracing::warn!(%error, "failed to persist execution");
        }
    }

    async fn record_order(&self, order: &Order) {
        self.inner
            .orders
            .write()
            .await
            .insert(order.order_id, order.clone());
        if let Err(error) = self.inner.store.save_order(order).await {
            tracing::warn!(%error, "failed to persist order");
        }
    }
}
