//! HTTP and WebSocket surface for the card lobby synchronizers.

pub mod api;
pub mod config;
pub mod metrics;
