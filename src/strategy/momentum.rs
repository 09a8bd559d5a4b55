//! Momentum strategy
//!
//! Trades in the direction of the trailing window return: BUY when the
//! window return clears `+entry_threshold`, SELL when it clears
//! `-entry_threshold`. Position size risks a fixed fraction of portfolio
//! value against the stop distance.

use super::{to_decimal, window_risk_metrics, RiskMetrics, Strategy, StrategyKind, StrategyParams};
use crate::error::EngineError;
use crate::market::PriceSeries;
use crate::signal::{SignalDirection, TradingSignal};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

const DEFAULT_LOOKBACK: usize = 20;
const DEFAULT_ENTRY_THRESHOLD: f64 = 0.02;
const DEFAULT_STOP_LOSS_PCT: f64 = 0.05;
const DEFAULT_TAKE_PROFIT_PCT: f64 = 0.10;
const DEFAULT_RISK_PER_TRADE: f64 = 0.02;
const DEFAULT_MAX_POSITION_FRACTION: f64 = 0.25;

/// Trend-following strategy over a trailing bar window
pub struct MomentumStrategy {
    id: Uuid,
    symbol: String,
    params: StrategyParams,
}

impl MomentumStrategy {
    pub fn new(symbol: impl Into<String>, params: StrategyParams) -> Result<Self, EngineError> {
        Self::validate_params(&params)?;
        Ok(Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            params,
        })
    }

    fn validate_params(params: &StrategyParams) -> Result<(), EngineError> {
        params.require_window("lookback", DEFAULT_LOOKBACK)?;
        params.require_positive("entry_threshold", DEFAULT_ENTRY_THRESHOLD)?;
        params.require_positive("stop_loss_pct", DEFAULT_STOP_LOSS_PCT)?;
        params.require_positive("take_profit_pct", DEFAULT_TAKE_PROFIT_PCT)?;
        params.require_positive("risk_per_trade", DEFAULT_RISK_PER_TRADE)?;
        params.require_positive("max_position_fraction", DEFAULT_MAX_POSITION_FRACTION)?;
        Ok(())
    }

    fn lookback(&self) -> usize {
        self.params.get_or("lookback", DEFAULT_LOOKBACK as f64) as usize
    }

    fn entry_threshold(&self) -> f64 {
        self.params.get_or("entry_threshold", DEFAULT_ENTRY_THRESHOLD)
    }

    /// Window return across the trailing lookback bars
    fn window_momentum(&self, history: &PriceSeries) -> Option<f64> {
        let closes = history.trailing_closes(self.lookback() + 1);
        if closes.len() < self.lookback() + 1 {
            return None;
        }
        let first = closes.first()?.to_f64()?;
        let last = closes.last()?.to_f64()?;
        if first <= 0.0 {
            return None;
        }
        Some((last - first) / first)
    }

    fn confidence(&self, strength: f64, history: &PriceSeries) -> f64 {
        // Blend of move size and window coverage
        let coverage = (history.len().min(100) as f64) / 100.0;
        strength * 0.6 + coverage * 0.4
    }
}

impl Strategy for MomentumStrategy {
    fn id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Momentum
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn params(&self) -> &StrategyParams {
        &self.params
    }

    fn update_params(&mut self, params: StrategyParams) -> Result<(), EngineError> {
        let mut merged = self.params.clone();
        merged.merge(&params);
        Self::validate_params(&merged)?;
        self.params = merged;
        Ok(())
    }

    fn generate_signals(&self, history: &PriceSeries) -> Result<Vec<TradingSignal>, EngineError> {
        let Some(momentum) = self.window_momentum(history) else {
            return Ok(vec![]);
        };
        let threshold = self.entry_threshold();
        if momentum.abs() < threshold {
            return Ok(vec![]);
        }

        let last = history
            .last()
            .ok_or_else(|| EngineError::StrategyRuntime("empty price history".to_string()))?;
        let price = last.close;
        if price <= Decimal::ZERO {
            return Ok(vec![]);
        }

        let direction = if momentum > 0.0 {
            SignalDirection::Buy
        } else {
            SignalDirection::Sell
        };
        let strength = (momentum.abs() / threshold).min(1.0);

        let stop_pct = to_decimal(self.params.get_or("stop_loss_pct", DEFAULT_STOP_LOSS_PCT));
        let target_pct =
            to_decimal(self.params.get_or("take_profit_pct", DEFAULT_TAKE_PROFIT_PCT));
        let (stop_loss, take_profit) = match direction {
            SignalDirection::Buy => (
                stop_pct.map(|p| price * (Decimal::ONE - p)),
                target_pct.map(|p| price * (Decimal::ONE + p)),
            ),
            _ => (
                stop_pct.map(|p| price * (Decimal::ONE + p)),
                target_pct.map(|p| price * (Decimal::ONE - p)),
            ),
        };

        let signal = TradingSignal::new(
            self.id,
            &self.symbol,
            direction,
            strength,
            self.confidence(strength, history),
            price,
            stop_loss,
            take_profit,
        )
        .with_metadata(serde_json::json!({
            "momentum": momentum,
            "lookback": self.lookback(),
        }));

        Ok(vec![signal])
    }

    fn size_position(&self, signal: &TradingSignal, portfolio_value: Decimal) -> Decimal {
        if portfolio_value <= Decimal::ZERO || signal.price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let Some(stop) = signal.stop_loss else {
            return Decimal::ZERO;
        };
        let stop_distance = (signal.price - stop).abs();
        if stop_distance <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let Some(risk_per_trade) =
            to_decimal(self.params.get_or("risk_per_trade", DEFAULT_RISK_PER_TRADE))
        else {
            return Decimal::ZERO;
        };
        let Some(max_fraction) = to_decimal(
            self.params
                .get_or("max_position_fraction", DEFAULT_MAX_POSITION_FRACTION),
        ) else {
            return Decimal::ZERO;
        };

        let risk_budget = portfolio_value * risk_per_trade;
        let quantity = risk_budget / stop_distance;
        let max_quantity = portfolio_value * max_fraction / signal.price;

        quantity.min(max_quantity).max(Decimal::ZERO)
    }

    fn risk_metrics(&self, history: &PriceSeries) -> RiskMetrics {
        window_risk_metrics(history, self.lookback() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::PriceBar;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn series(closes: &[Decimal]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, close)| PriceBar {
                timestamp: start + Duration::minutes(i as i64),
                open: *close,
                high: *close,
                low: *close,
                close: *close,
                volume: dec!(1),
            })
            .collect();
        PriceSeries::new("BTCUSDT", bars)
    }

    fn rising_series() -> PriceSeries {
        // 21 bars from 45000 to 47000 in equal 100-point steps
        let closes: Vec<Decimal> = (0..=20).map(|i| dec!(45000) + Decimal::from(i * 100)).collect();
        series(&closes)
    }

    fn strategy() -> MomentumStrategy {
        let params: StrategyParams = [
            ("lookback".to_string(), 20.0),
            ("entry_threshold".to_string(), 0.02),
        ]
        .into_iter()
        .collect();
        MomentumStrategy::new("BTCUSDT", params).unwrap()
    }

    #[test]
    fn test_rising_series_emits_buy() {
        let signals = strategy().generate_signals(&rising_series()).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, SignalDirection::Buy);
        assert!(signals[0].strength > 0.0);
        assert!(signals[0].strength <= 1.0);
        assert!(signals[0].stop_loss.unwrap() < signals[0].price);
        assert!(signals[0].take_profit.unwrap() > signals[0].price);
    }

    #[test]
    fn test_falling_series_emits_sell() {
        let closes: Vec<Decimal> = (0..=20).map(|i| dec!(47000) - Decimal::from(i * 100)).collect();
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, SignalDirection::Sell);
        assert!(signals[0].stop_loss.unwrap() > signals[0].price);
    }

    #[test]
    fn test_flat_series_emits_nothing() {
        let closes = vec![dec!(45000); 30];
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn test_insufficient_history_emits_nothing() {
        let closes: Vec<Decimal> = (0..5).map(|i| dec!(45000) + Decimal::from(i * 100)).collect();
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn test_strength_capped_at_one() {
        // 20% move over the window against a 2% threshold
        let closes: Vec<Decimal> = (0..=20).map(|i| dec!(45000) + Decimal::from(i * 450)).collect();
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert_eq!(signals[0].strength, 1.0);
    }

    #[test]
    fn test_size_position_risk_budget() {
        let strat = strategy();
        let mut signal = TradingSignal::new(
            strat.id(),
            "BTCUSDT",
            SignalDirection::Buy,
            1.0,
            0.8,
            dec!(45000),
            Some(dec!(42750)),
            None,
        );
        signal.quantity = dec!(0);

        let quantity = strat.size_position(&signal, dec!(100000));
        assert!(quantity > dec!(0));
        // Cap binds: notional never exceeds max_position_fraction of portfolio
        assert!(quantity * dec!(45000) <= dec!(100000) * dec!(0.25));
    }

    #[test]
    fn test_size_position_zero_on_missing_stop() {
        let strat = strategy();
        let signal = TradingSignal::new(
            strat.id(),
            "BTCUSDT",
            SignalDirection::Buy,
            1.0,
            0.8,
            dec!(45000),
            None,
            None,
        );
        assert_eq!(strat.size_position(&signal, dec!(100000)), dec!(0));
    }

    #[test]
    fn test_size_position_zero_on_zero_stop_distance() {
        let strat = strategy();
        let signal = TradingSignal::new(
            strat.id(),
            "BTCUSDT",
            SignalDirection::Buy,
            1.0,
            0.8,
            dec!(45000),
            Some(dec!(45000)),
            None,
        );
        assert_eq!(strat.size_position(&signal, dec!(100000)), dec!(0));
    }

    #[test]
    fn test_update_params_rejects_malformed() {
        let mut strat = strategy();
        let bad: StrategyParams = [("lookback".to_string(), 0.0)].into_iter().collect();
        assert!(strat.update_params(bad).is_err());
        // Original parameters untouched after a rejected update
        assert_eq!(strat.params().get("lookback"), Some(20.0));
    }

    #[test]
    fn test_update_params_applies() {
        let mut strat = strategy();
        let update: StrategyParams = [("entry_threshold".to_string(), 0.05)].into_iter().collect();
        strat.update_params(update).unwrap();
        assert_eq!(strat.params().get("entry_threshold"), Some(0.05));
    }

    #[test]
    fn test_risk_metrics_on_window() {
        let metrics = strategy().risk_metrics(&rising_series());
        assert_eq!(metrics.sample_count, 20);
        assert!(metrics.mean_return > 0.0);
        assert!(metrics.volatility >= 0.0);
    }

    #[test]
    fn test_constructor_rejects_bad_params() {
        let bad: StrategyParams = [("entry_threshold".to_string(), -1.0)].into_iter().collect();
        assert!(MomentumStrategy::new("BTCUSDT", bad).is_err());
    }
}
