//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{record_order_filled, record_signal, set_max_drawdown, set_net_pnl};

use crate::config::TelemetryConfig;

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level)?;

    if config.metrics_enabled {
        metrics::install_exporter(config.metrics_port)?;
    }

    Ok(())
}
