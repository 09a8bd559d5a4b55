//! Market data source boundary

use super::PriceSeries;
use async_trait::async_trait;

/// Trait for market data collaborators
///
/// Live transport and normalization happen outside the engine; the engine
/// only asks for a trailing snapshot per symbol.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Latest `window` bars for a symbol, oldest first
    async fn latest_bars(&self, symbol: &str, window: usize) -> anyhow::Result<PriceSeries>;
}
