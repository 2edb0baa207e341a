use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use serde::Serialize;
use tokio::{sync::Mutex, time::timeout};

use super::sink::FrameSink;
use crate::{
    errors::TransportError,
    ids::{ConnectionId, UserId},
};

/// One live client socket.
///
/// All writes go through a per-connection lock so that broadcasts, pings
/// and countdown ticks never interleave on the same socket. Every write is
/// bounded by `write_timeout`.
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    sink: Mutex<Box<dyn FrameSink>>,
    write_timeout: Duration,
    closed: AtomicBool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection {
    pub fn new(user_id: UserId, sink: Box<dyn FrameSink>, write_timeout: Duration) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            sink: Mutex::new(sink),
            write_timeout,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Serialize `value` and send it as one text frame
    pub async fn send_json<T: Serialize>(&self, value: &T) -> Result<(), TransportError> {
        let text =
            serde_json::to_string(value).map_err(|e| TransportError::Send(e.to_string()))?;
        self.send_text(text).await
    }

    pub async fn send_text(&self, text: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut sink = self.sink.lock().await;
        match timeout(self.write_timeout, sink.send_text(text)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    pub async fn send_ping(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut sink = self.sink.lock().await;
        match timeout(self.write_timeout, sink.send_ping(payload)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    /// Close the socket. Only the first call reaches the sink.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut sink = self.sink.lock().await;
        match timeout(self.write_timeout, sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::debug!("close of connection {} failed: {e}", self.id),
            Err(_) => log::debug!("close of connection {} timed out", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::sink::{ChannelSink, Frame};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StalledSink;

    #[async_trait]
    impl FrameSink for StalledSink {
        async fn send_text(&mut self, _text: String) -> Result<(), TransportError> {
            std::future::pending().await
        }

        async fn send_ping(&mut self, _payload: Vec<u8>) -> Result<(), TransportError> {
            std::future::pending().await
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    /// Writes every frame in two pieces with a yield in between
    struct SplitWriteSink(Arc<std::sync::Mutex<Vec<String>>>);

    impl SplitWriteSink {
        async fn write_in_halves(&self, frame: String) {
            let (head, tail) = frame.split_at(frame.len() / 2);
            self.0.lock().unwrap().push(head.to_string());
            tokio::task::yield_now().await;
            self.0.lock().unwrap().push(tail.to_string());
        }
    }

    #[async_trait]
    impl FrameSink for SplitWriteSink {
        async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
            self.write_in_halves(text).await;
            Ok(())
        }

        async fn send_ping(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
            let payload = String::from_utf8_lossy(&payload).into_owned();
            self.write_in_halves(format!("<{payload}>")).await;
            Ok(())
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_send_json_writes_text_frame() {
        let (sink, mut rx) = ChannelSink::new();
        let conn = Connection::new(7, Box::new(sink), Duration::from_secs(1));

        conn.send_json(&serde_json::json!({"hello": "world"}))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(Frame::Text(r#"{"hello":"world"}"#.to_string()))
        );
    }

    #[tokio::test]
    async fn test_dropped_receiver_fails_send() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let conn = Connection::new(7, Box::new(sink), Duration::from_secs(1));

        assert_eq!(
            conn.send_text("x".to_string()).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_write_times_out() {
        let conn = Connection::new(7, Box::new(StalledSink), Duration::from_secs(5));

        assert_eq!(
            conn.send_text("x".to_string()).await,
            Err(TransportError::Timeout)
        );
        assert_eq!(conn.send_ping(b"ping".to_vec()).await, Err(TransportError::Timeout));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (sink, mut rx) = ChannelSink::new();
        let conn = Connection::new(7, Box::new(sink), Duration::from_secs(1));

        conn.close().await;
        conn.close().await;

        assert_eq!(rx.recv().await, Some(Frame::Close));
        assert!(rx.try_recv().is_err());
        assert!(conn.is_closed());
        assert_eq!(
            conn.send_text("late".to_string()).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_never_interleave() {
        let pieces = Arc::new(std::sync::Mutex::new(Vec::new()));
        let conn = Arc::new(Connection::new(
            7,
            Box::new(SplitWriteSink(pieces.clone())),
            Duration::from_secs(5),
        ));

        let mut expected = Vec::new();
        let mut tasks = Vec::new();
        for writer in 0..6 {
            for seq in 0..50 {
                let conn = conn.clone();
                if writer == 0 {
                    expected.push("<ping>".to_string());
                    tasks.push(tokio::spawn(async move {
                        conn.send_ping(b"ping".to_vec()).await
                    }));
                } else {
                    let frame = serde_json::json!({"writer": writer, "seq": seq}).to_string();
                    expected.push(frame.clone());
                    tasks.push(tokio::spawn(async move { conn.send_text(frame).await }));
                }
            }
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let pieces = pieces.lock().unwrap();
        let mut frames: Vec<String> = pieces.chunks(2).map(|pair| pair.concat()).collect();
        frames.sort();
        expected.sort();
        assert_eq!(frames, expected);
    }
}
