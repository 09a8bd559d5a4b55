//! Historical bar loading and file-backed replay
//!
//! Bars come from CSV files with a `timestamp,open,high,low,close,volume`
//! header. The replay source feeds the same file to a live executor one bar
//! per evaluation cycle.

use crate::market::{MarketDataSource, PriceBar, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

/// Load a bar series from a CSV file, oldest first
pub fn load_bars_csv(path: impl AsRef<Path>, symbol: &str) -> anyhow::Result<PriceSeries> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| anyhow::anyhow!("failed to open {}: {}", path.display(), e))?;

    let mut bars: Vec<PriceBar> = vec![];
    for (line, result) in reader.deserialize::<BarRecord>().enumerate() {
        let record =
            result.map_err(|e| anyhow::anyhow!("bad bar record at line {}: {}", line + 2, e))?;
        bars.push(PriceBar {
            timestamp: record.timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    tracing::info!(path = %path.display(), bars = bars.len(), symbol, "loaded bar file");
    Ok(PriceSeries::new(symbol, bars))
}

/// File-backed market data source
///
/// In the default per-call mode the cursor advances one bar per
/// `latest_bars` call, which suits a single consumer replaying the file
/// deterministically. When several strategy loops share one source, use
/// [`ReplaySource::paced`]: the cursor advances with wall-clock time so all
/// callers within the same evaluation cycle see the same snapshot. Once the
/// file is exhausted the source keeps serving the final window; strategies
/// then see no new data and go quiet instead of erroring out.
pub struct ReplaySource {
    series: PriceSeries,
    cursor: AtomicUsize,
    pace: Option<(Instant, Duration)>,
}

impl ReplaySource {
    /// One bar per call; suitable for a single consumer
    pub fn new(series: PriceSeries) -> Self {
        Self {
            series,
            cursor: AtomicUsize::new(0),
            pace: None,
        }
    }

    /// One bar per `step` of elapsed wall-clock time, shared across callers
    pub fn paced(series: PriceSeries, step: Duration) -> Self {
        Self {
            series,
            cursor: AtomicUsize::new(0),
            pace: Some((Instant::now(), step)),
        }
    }

    pub fn from_csv(path: impl AsRef<Path>, symbol: &str) -> anyhow::Result<Self> {
        Ok(Self::new(load_bars_csv(path, symbol)?))
    }

    fn position(&self) -> usize {
        match &self.pace {
            Some((start, step)) => {
                (start.elapsed().as_nanos() / step.as_nanos().max(1)) as usize
            }
            None => self.cursor.load(Ordering::SeqCst),
        }
    }

    /// True once every bar has been served at least once
    pub fn exhausted(&self) -> bool {
        self.position() >= self.series.len()
    }
}

#[async_trait]
impl MarketDataSource for ReplaySource {
    async fn latest_bars(&self, symbol: &str, window: usize) -> anyhow::Result<PriceSeries> {
        if symbol != self.series.symbol {
            anyhow::bail!(
                "replay source holds {}, requested {}",
                self.series.symbol,
                symbol
            );
        }
        if self.series.is_empty() {
            anyhow::bail!("replay source has no bars");
        }

        let cursor = match &self.pace {
            Some(_) => self.position(),
            None => self.cursor.fetch_add(1, Ordering::SeqCst),
        };
        let last = cursor.min(self.series.len() - 1);

        let visible = self.series.up_to(last);
        let bars = visible.trailing(window).to_vec();
        Ok(PriceSeries::new(visible.symbol, bars))
    }
}
