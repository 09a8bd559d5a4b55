//! Trading signals
//!
//! Immutable proposals produced by strategies, consumed exactly once by the
//! executor.

mod types;

pub use types::{SignalDirection, TradingSignal};
