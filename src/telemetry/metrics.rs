//! Prometheus metrics

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::net::{Ipv4Addr, SocketAddr};

/// Start the Prometheus scrape endpoint
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(port, "metrics exporter listening");
    Ok(())
}

/// Count one signal through the pipeline, labelled by outcome
pub fn record_signal(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    counter!("tradeloop_signals_total", "outcome" => outcome).increment(1);
}

/// Count one filled order
pub fn record_order_filled() {
    counter!("tradeloop_orders_filled_total").increment(1);
}

/// Export net PnL across all closed trades
pub fn set_net_pnl(net_pnl: Decimal) {
    gauge!("tradeloop_net_pnl_usd").set(net_pnl.to_f64().unwrap_or(0.0));
}

/// Export the worst equity decline from peak, in [0, 1]
pub fn set_max_drawdown(drawdown: f64) {
    gauge!("tradeloop_max_drawdown").set(drawdown);
}
