//! Mean-reversion strategy
//!
//! Fades moves away from the trailing mean: SELL when the latest close sits
//! more than `deviation_threshold` standard deviations above it, BUY when
//! below. Sizing uses a small base fraction scaled by signal strength.

use super::{to_decimal, window_risk_metrics, RiskMetrics, Strategy, StrategyKind, StrategyParams};
use crate::error::EngineError;
use crate::market::PriceSeries;
use crate::signal::{SignalDirection, TradingSignal};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

const DEFAULT_LOOKBACK: usize = 20;
const DEFAULT_DEVIATION_THRESHOLD: f64 = 2.0;
const DEFAULT_BASE_FRACTION: f64 = 0.01;
const DEFAULT_STOP_LOSS_PCT: f64 = 0.03;
const DEFAULT_TAKE_PROFIT_PCT: f64 = 0.05;
const DEFAULT_MAX_POSITION_FRACTION: f64 = 0.25;

/// Z-score reversion strategy over a trailing bar window
pub struct MeanReversionStrategy {
    id: Uuid,
    symbol: String,
    params: StrategyParams,
}

impl MeanReversionStrategy {
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
        params.require_positive("deviation_threshold", DEFAULT_DEVIATION_THRESHOLD)?;
        params.require_positive("base_fraction", DEFAULT_BASE_FRACTION)?;
        params.require_positive("stop_loss_pct", DEFAULT_STOP_LOSS_PCT)?;
        params.require_positive("take_profit_pct", DEFAULT_TAKE_PROFIT_PCT)?;
        params.require_positive("max_position_fraction", DEFAULT_MAX_POSITION_FRACTION)?;
        Ok(())
    }

    fn lookback(&self) -> usize {
        self.params.get_or("lookback", DEFAULT_LOOKBACK as f64) as usize
    }

    fn deviation_threshold(&self) -> f64 {
        self.params
            .get_or("deviation_threshold", DEFAULT_DEVIATION_THRESHOLD)
    }

    /// Z-score of the latest close against the trailing window mean/stddev
    ///
    /// The window includes the latest bar, so a single outlier keeps the
    /// standard deviation strictly positive.
    fn zscore(&self, history: &PriceSeries) -> Option<f64> {
        let closes = history.trailing_closes(self.lookback());
        if closes.len() < self.lookback() {
            return None;
        }

        let values: Vec<f64> = closes.iter().filter_map(|c| c.to_f64()).collect();
        if values.len() < self.lookback() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let stddev = variance.sqrt();
        if stddev == 0.0 {
            return None;
        }

        let last = *values.last()?;
        Some((last - mean) / stddev)
    }

    fn confidence(&self, strength: f64, history: &PriceSeries) -> f64 {
        let coverage = (history.len().min(100) as f64) / 100.0;
        strength * 0.6 + coverage * 0.4
    }
}

impl Strategy for MeanReversionStrategy {
    fn id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::MeanReversion
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
        let Some(z) = self.zscore(history) else {
            return Ok(vec![]);
        };
        let threshold = self.deviation_threshold();
        if z.abs() < threshold {
            return Ok(vec![]);
        }

        let last = history
            .last()
            .ok_or_else(|| EngineError::StrategyRuntime("empty price history".to_string()))?;
        let price = last.close;
        if price <= Decimal::ZERO {
            return Ok(vec![]);
        }

        // Stretched above the mean reverts down, below reverts up
        let direction = if z > 0.0 {
            SignalDirection::Sell
        } else {
            SignalDirection::Buy
        };
        let strength = (z.abs() / threshold).min(1.0);

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
            "zscore": z,
            "lookback": self.lookback(),
        }));

        Ok(vec![signal])
    }

    fn size_position(&self, signal: &TradingSignal, portfolio_value: Decimal) -> Decimal {
        if portfolio_value <= Decimal::ZERO || signal.price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let Some(base_fraction) =
            to_decimal(self.params.get_or("base_fraction", DEFAULT_BASE_FRACTION))
        else {
            return Decimal::ZERO;
        };
        let Some(strength) = to_decimal(signal.strength) else {
            return Decimal::ZERO;
        };
        let Some(max_fraction) = to_decimal(
            self.params
                .get_or("max_position_fraction", DEFAULT_MAX_POSITION_FRACTION),
        ) else {
            return Decimal::ZERO;
        };

        let notional = portfolio_value * base_fraction * strength;
        let quantity = notional / signal.price;
        let max_quantity = portfolio_value * max_fraction / signal.price;

        quantity.min(max_quantity).max(Decimal::ZERO)
    }

    fn risk_metrics(&self, history: &PriceSeries) -> RiskMetrics {
        window_risk_metrics(history, self.lookback())
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

    fn strategy() -> MeanReversionStrategy {
        let params: StrategyParams = [
            ("lookback".to_string(), 20.0),
            ("deviation_threshold".to_string(), 2.0),
        ]
        .into_iter()
        .collect();
        MeanReversionStrategy::new("BTCUSDT", params).unwrap()
    }

    #[test]
    fn test_upward_spike_emits_sell() {
        let mut closes = vec![dec!(100); 20];
        closes.push(dec!(110));
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, SignalDirection::Sell);
        assert!(signals[0].strength > 0.0);
    }

    #[test]
    fn test_downward_spike_emits_buy() {
        let mut closes = vec![dec!(100); 20];
        closes.push(dec!(90));
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, SignalDirection::Buy);
    }

    #[test]
    fn test_flat_series_emits_nothing() {
        let closes = vec![dec!(100); 25];
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn test_small_deviation_emits_nothing() {
        // Mild noise stays inside two standard deviations
        let closes: Vec<Decimal> = (0..25)
            .map(|i| if i % 2 == 0 { dec!(100) } else { dec!(101) })
            .collect();
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn test_insufficient_history_emits_nothing() {
        let closes = vec![dec!(100); 10];
        let signals = strategy().generate_signals(&series(&closes)).unwrap();
        assert!(signals.is_empty());
    }

    #[test]
    fn test_size_scales_with_strength() {
        let strat = strategy();
        let strong = TradingSignal::new(
            strat.id(),
            "BTCUSDT",
            SignalDirection::Buy,
            1.0,
            0.8,
            dec!(100),
            None,
            None,
        );
        let weak = TradingSignal::new(
            strat.id(),
            "BTCUSDT",
            SignalDirection::Buy,
            0.5,
            0.8,
            dec!(100),
            None,
            None,
        );

        let strong_qty = strat.size_position(&strong, dec!(100000));
        let weak_qty = strat.size_position(&weak, dec!(100000));
        assert!(strong_qty > weak_qty);
        assert!(weak_qty > dec!(0));
    }

    #[test]
    fn test_size_zero_on_bad_inputs() {
        let strat = strategy();
        let signal = TradingSignal::new(
            strat.id(),
            "BTCUSDT",
            SignalDirection::Buy,
            1.0,
            0.8,
            dec!(100),
            None,
            None,
        );
        assert_eq!(strat.size_position(&signal, dec!(0)), dec!(0));
    }

    #[test]
    fn test_size_respects_max_fraction() {
        let params: StrategyParams = [
            ("base_fraction".to_string(), 0.9),
            ("max_position_fraction".to_string(), 0.25),
        ]
        .into_iter()
        .collect();
        let strat = MeanReversionStrategy::new("BTCUSDT", params).unwrap();
        let signal = TradingSignal::new(
            strat.id(),
            "BTCUSDT",
            SignalDirection::Buy,
            1.0,
            0.8,
            dec!(100),
            None,
            None,
        );

        let quantity = strat.size_position(&signal, dec!(100000));
        assert!(quantity * dec!(100) <= dec!(100000) * dec!(0.25));
    }

    #[test]
    fn test_constructor_rejects_bad_params() {
        let bad: StrategyParams = [("deviation_threshold".to_string(), 0.0)].into_iter().collect();
        assert!(MeanReversionStrategy::new("BTCUSDT", bad).is_err());
    }
}
