//! Per-connection countdown broadcast.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{config::SyncConfig, protocol::ServerFrame, registry::Connection};

/// Countdown shape: start value, wall-clock tick and per-tick decrement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    pub total: f64,
    pub tick: Duration,
    pub step: f64,
}

impl Countdown {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            total: config.countdown_total,
            tick: config.countdown_tick,
            step: config.countdown_step,
        }
    }

    /// Remaining-seconds values in send order, ending with `0.0`.
    ///
    /// The first value is always `total`. Later values are `total - n * step`
    /// rounded to the microsecond, so `15.0` with step `0.1` yields exactly
    /// `15.0, 14.9, ..., 0.1, 0.0`.
    pub fn values(&self) -> impl Iterator<Item = f64> + use<> {
        let (total, step) = (self.total, self.step);
        let limit = if step > 0.0 { u64::MAX } else { 1 };
        (0..limit)
            .map(move |n| round_micros(total - n as f64 * step))
            .take_while(|remaining| *remaining > 0.0)
            .chain(std::iter::once(0.0))
    }
}

fn round_micros(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Send `timer` frames to `conn` until the countdown reaches zero.
///
/// The first frame goes out immediately. The task stops early at the first
/// failed write.
pub fn spawn_countdown(conn: Arc<Connection>, countdown: Countdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(countdown.tick);
        for remaining in countdown.values() {
            ticker.tick().await;
            if let Err(e) = conn.send_json(&ServerFrame::Timer { remaining }).await {
                log::debug!("countdown for {} stopped: {e}", conn.id());
                return;
            }
        }
        log::debug!("countdown for {} finished", conn.id());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ChannelSink, Frame};

    fn countdown(total: f64) -> Countdown {
        Countdown {
            total,
            tick: Duration::from_millis(100),
            step: 0.1,
        }
    }

    #[test]
    fn test_values_have_no_drift() {
        let values: Vec<f64> = countdown(15.0).values().collect();
        assert_eq!(values.len(), 151);
        assert_eq!(values[0], 15.0);
        assert_eq!(values[1], 14.9);
        assert_eq!(values[149], 0.1);
        assert_eq!(values[150], 0.0);
    }

    #[test]
    fn test_zero_total_sends_single_zero() {
        let values: Vec<f64> = countdown(0.0).values().collect();
        assert_eq!(values, vec![0.0]);
    }

    #[test]
    fn test_fractional_total_is_sent_first() {
        let values: Vec<f64> = countdown(0.35).values().collect();
        assert_eq!(values, vec![0.35, 0.25, 0.15, 0.05, 0.0]);

        let values: Vec<f64> = countdown(0.04).values().collect();
        assert_eq!(values, vec![0.04, 0.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_sends_every_tick_then_stops() {
        let (sink, mut rx) = ChannelSink::new();
        let conn = Arc::new(Connection::new(1, Box::new(sink), Duration::from_secs(5)));

        spawn_countdown(conn, countdown(0.3)).await.unwrap();

        let mut remaining = Vec::new();
        while let Ok(Frame::Text(text)) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(value["type"], "timer");
            remaining.push(value["remaining"].as_f64().unwrap());
        }
        assert_eq!(remaining, vec![0.3, 0.2, 0.1, 0.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_stops_on_write_failure() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let conn = Arc::new(Connection::new(1, Box::new(sink), Duration::from_secs(5)));

        // Finishes right away instead of running for 15 seconds
        let handle = spawn_countdown(conn, countdown(15.0));
        tokio::time::timeout(Duration::from_millis(50), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
