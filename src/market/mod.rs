//! Market data model
//!
//! Normalized price bars and the market-data-source boundary. The engine
//! only ever reads a trailing window of bars, never a live feed of its own.

mod source;
mod types;

pub use source::MarketDataSource;
pub use types::{PriceBar, PriceSeries};
