//! Price bar types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Bar timestamp (open time)
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl PriceBar {
    /// Whether the bar carries usable prices
    pub fn is_valid(&self) -> bool {
        self.open > Decimal::ZERO
            && self.high > Decimal::ZERO
            && self.low > Decimal::ZERO
            && self.close > Decimal::ZERO
            && self.low <= self.high
    }
}

/// Chronologically ordered bars for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Create a series from pre-sorted bars
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    /// Create an empty series
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, vec![])
    }

    /// Append a bar (caller keeps chronological order)
    pub fn push(&mut self, bar: PriceBar) {
        self.bars.push(bar);
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Trailing window of up to `n` bars ending at the latest bar
    pub fn trailing(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    /// Prefix of the series up to and including bar `idx`.
    ///
    /// Used by the backtest replay so a strategy never sees bars past the
    /// one being processed.
    pub fn up_to(&self, idx: usize) -> Self {
        let end = (idx + 1).min(self.bars.len());
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[..end].to_vec(),
        }
    }

    /// Close prices of the trailing `n` bars
    pub fn trailing_closes(&self, n: usize) -> Vec<Decimal> {
        self.trailing(n).iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn bar(offset_secs: i64, close: Decimal) -> PriceBar {
        let ts = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::seconds(offset_secs);
        PriceBar {
            timestamp: ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1),
        }
    }

    #[test]
    fn test_bar_validity() {
        assert!(bar(0, dec!(45000)).is_valid());

        let mut bad = bar(0, dec!(45000));
        bad.close = dec!(0);
        assert!(!bad.is_valid());

        let mut inverted = bar(0, dec!(45000));
        inverted.low = dec!(46000);
        inverted.high = dec!(44000);
        assert!(!inverted.is_valid());
    }

    #[test]
    fn test_trailing_window() {
        let bars: Vec<PriceBar> = (0..10).map(|i| bar(i * 60, dec!(100) + Decimal::from(i))).collect();
        let series = PriceSeries::new("BTCUSDT", bars);

        assert_eq!(series.trailing(3).len(), 3);
        assert_eq!(series.trailing(3)[0].close, dec!(107));
        assert_eq!(series.trailing(100).len(), 10);
    }

    #[test]
    fn test_up_to_hides_future_bars() {
        let bars: Vec<PriceBar> = (0..10).map(|i| bar(i * 60, dec!(100) + Decimal::from(i))).collect();
        let series = PriceSeries::new("BTCUSDT", bars);

        let visible = series.up_to(4);
        assert_eq!(visible.len(), 5);
        assert_eq!(visible.last().unwrap().close, dec!(104));
    }

    #[test]
    fn test_empty_series() {
        let series = PriceSeries::empty("BTCUSDT");
        assert!(series.is_empty());
        assert!(series.last().is_none());
        assert!(series.trailing(5).is_empty());
    }
}
