//! Configuration types for tradeloop

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub strategy: Vec<StrategyConfig>,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Executor-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Seconds between evaluation cycles for each active strategy
    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_secs: u64,

    /// Starting portfolio value per fund
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,

    /// Trailing bar window handed to strategies each cycle
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_evaluation_interval() -> u64 {
    60
}
fn default_initial_capital() -> Decimal {
    Decimal::new(100_000, 0)
}
fn default_history_window() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: 60,
            initial_capital: default_initial_capital(),
            history_window: 100,
        }
    }
}

/// One strategy to register at startup
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Strategy type name ("momentum" or "mean_reversion")
    pub kind: String,
    /// Instrument the strategy trades
    pub symbol: String,
    /// Fund whose risk budget the strategy draws on
    #[serde(default = "default_fund")]
    pub fund_id: String,
    /// Named numeric parameters (lookback, thresholds, fractions)
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

fn default_fund() -> String {
    "default".to_string()
}

/// Fund-level risk limits, re-read between cycles
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Maximum aggregate risk as fraction of portfolio value
    #[serde(default = "default_max_total_risk")]
    pub max_total_risk: Decimal,

    /// Fraction of notional assumed at risk per signal
    #[serde(default = "default_assumed_risk_fraction")]
    pub assumed_risk_fraction: Decimal,
}

fn default_max_total_risk() -> Decimal {
    Decimal::new(10, 2) // 0.10
}
fn default_assumed_risk_fraction() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_total_risk: default_max_total_risk(),
            assumed_risk_fraction: default_assumed_risk_fraction(),
        }
    }
}

/// Execution engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,
}

fn default_commission_rate() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Paper,
            commission_rate: default_commission_rate(),
        }
    }
}

/// Execution mode: paper trading or live
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Paper,
    Live,
}

/// Backtest replay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestConfig {
    /// Fraction of current cash allocated on each BUY
    #[serde(default = "default_allocation_fraction")]
    pub allocation_fraction: Decimal,

    /// Commission charged per simulated fill
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,

    /// Bars per year used to annualize the Sharpe ratio
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,
}

fn default_allocation_fraction() -> Decimal {
    Decimal::new(10, 2) // 0.10
}
fn default_periods_per_year() -> f64 {
    252.0
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            allocation_fraction: default_allocation_fraction(),
            commission_rate: default_commission_rate(),
            periods_per_year: 252.0,
        }
    }
}

/// Historical bar file configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DataConfig {
    /// CSV file of bars used by `run` (replay) and `backtest`
    #[serde(default)]
    pub bars_path: Option<PathBuf>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub metrics_enabled: bool,
}

fn default_metrics_port() -> u16 {
    9090
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
            metrics_enabled: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [engine]
            evaluation_interval_secs = 30
            initial_capital = 100000.0
            history_window = 50

            [[strategy]]
            kind = "momentum"
            symbol = "BTCUSDT"
            fund_id = "alpha"

            [strategy.params]
            lookback = 20
            entry_threshold = 0.02

            [risk]
            max_total_risk = 0.10
            assumed_risk_fraction = 0.02

            [execution]
            mode = "paper"
            commission_rate = 0.001

            [backtest]
            allocation_fraction = 0.10

            [telemetry]
            metrics_port = 9090
            log_level = "info"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.evaluation_interval_secs, 30);
        assert_eq!(config.strategy.len(), 1);
        assert_eq!(config.strategy[0].kind, "momentum");
        assert_eq!(config.strategy[0].params["lookback"], 20.0);
        assert_eq!(config.risk.max_total_risk, dec!(0.10));
        assert_eq!(config.execution.mode, ExecutionMode::Paper);
    }

    #[test]
    fn test_defaults_applied() {
        let toml = r#"
            [engine]

            [telemetry]
            metrics_port = 9090
            log_level = "info"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.engine.evaluation_interval_secs, 60);
        assert_eq!(config.engine.initial_capital, dec!(100000));
        assert_eq!(config.risk.max_total_risk, dec!(0.10));
        assert_eq!(config.execution.commission_rate, dec!(0.001));
        assert_eq!(config.backtest.allocation_fraction, dec!(0.10));
        assert!(config.strategy.is_empty());
        assert!(config.data.bars_path.is_none());
    }

    #[test]
    fn test_strategy_default_fund() {
        let toml = r#"
            [engine]

            [[strategy]]
            kind = "mean_reversion"
            symbol = "ETHUSDT"

            [telemetry]
            metrics_port = 9090
            log_level = "info"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.strategy[0].fund_id, "default");
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_execution_mode_live() {
        let toml = r#"
            [engine]

            [execution]
            mode = "live"

            [telemetry]
            metrics_port = 9090
            log_level = "info"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.execution.mode, ExecutionMode::Live);
    }
}
