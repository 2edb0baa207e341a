use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::TransportError;

/// Write half of one client connection.
///
/// Implementations are not required to be internally synchronized; the
/// owning [`super::Connection`] serializes every write.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    async fn send_ping(&mut self, payload: Vec<u8>) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Frame captured by a [`ChannelSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Ping(Vec<u8>),
    Close,
}

impl Frame {
    /// Text payload, if this is a text frame
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Frame::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Sink that forwards frames into an unbounded channel.
///
/// Used by tests and by in-process clients. Sends fail once the receiver
/// has been dropped, which is how a dead peer is simulated.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Frame>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, frame: Frame) -> Result<(), TransportError> {
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.push(Frame::Text(text))
    }

    async fn send_ping(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.push(Frame::Ping(payload))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.push(Frame::Close)
    }
}
