//! Keepalive pings.
//!
//! The read side of the deadline lives with whoever owns the socket's read
//! half: every inbound frame, pongs included, must arrive within
//! [`crate::config::SyncConfig::read_timeout`] of the previous one.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, interval_at},
};

use crate::registry::Connection;

/// Payload carried by every keepalive ping
pub const PING_PAYLOAD: &[u8] = b"ping";

/// Ping `conn` every `interval` until a write fails.
///
/// The first ping is sent one interval after spawning. Owners abort the
/// handle when the connection's read loop ends.
pub fn spawn_pinger(conn: Arc<Connection>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        loop {
            ticker.tick().await;
            if let Err(e) = conn.send_ping(PING_PAYLOAD.to_vec()).await {
                log::debug!("pinger for {} stopped: {e}", conn.id());
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ChannelSink, Frame};

    #[tokio::test(start_paused = true)]
    async fn test_pings_on_interval() {
        let (sink, mut rx) = ChannelSink::new();
        let conn = Arc::new(Connection::new(1, Box::new(sink), Duration::from_secs(5)));

        let handle = spawn_pinger(conn, Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv(), Ok(Frame::Ping(b"ping".to_vec())));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(rx.try_recv(), Ok(Frame::Ping(b"ping".to_vec())));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pinger_exits_after_failed_write() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let conn = Arc::new(Connection::new(1, Box::new(sink), Duration::from_secs(5)));

        let handle = spawn_pinger(conn, Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pinger_exits_after_close() {
        let (sink, _rx) = ChannelSink::new();
        let conn = Arc::new(Connection::new(1, Box::new(sink), Duration::from_secs(5)));
        conn.close().await;

        let handle = spawn_pinger(conn, Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_finished());
    }
}
