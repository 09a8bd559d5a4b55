//! Risk management
//!
//! A pure limiter evaluated before any order is created, and the per-fund
//! position book whose exposure the limiter reads.

mod limiter;
mod position;

pub use limiter::RiskLimiter;
pub use position::{ClosedTrade, Position, PositionBook};
