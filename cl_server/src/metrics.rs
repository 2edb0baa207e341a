//! Prometheus metrics for the lobby and table sockets.
//!
//! Metrics are exposed in Prometheus text format when `METRICS_BIND` is set.
//! Without an installed exporter every call below is a no-op.
//!
//! # Metrics
//!
//! - `ws_connections_active{socket}` / `ws_connections_total{socket}`
//! - `ws_frames_received_total{socket}`
//! - `frames_ignored_total{socket,reason}`
//! - `connections_pruned_total{socket}` (recorded by the connection registry)
//! - `bets_applied_total`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cl_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::connection_opened("lobby");
//! ```

use card_lobby::IgnoreReason;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// A socket finished admission and is live
pub fn connection_opened(socket: &'static str) {
    metrics::gauge!("ws_connections_active", "socket" => socket).increment(1.0);
    metrics::counter!("ws_connections_total", "socket" => socket).increment(1);
}

/// A live socket went away
pub fn connection_closed(socket: &'static str) {
    metrics::gauge!("ws_connections_active", "socket" => socket).decrement(1.0);
}

pub fn frame_received(socket: &'static str) {
    metrics::counter!("ws_frames_received_total", "socket" => socket).increment(1);
}

/// An inbound frame was dropped without a reply
pub fn frame_ignored(socket: &'static str, reason: IgnoreReason) {
    metrics::counter!("frames_ignored_total",
        "socket" => socket,
        "reason" => reason.as_str()
    )
    .increment(1);
}

pub fn bet_applied() {
    metrics::counter!("bets_applied_total").increment(1);
}
