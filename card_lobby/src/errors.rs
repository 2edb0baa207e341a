//! Top-level error types for connection admission and synchronization.

use thiserror::Error;

use crate::auth::AuthError;
use crate::ids::{RoomCode, UserId};
use crate::store::StoreError;

/// Socket write/read failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection already closed locally or by the peer
    #[error("Connection closed")]
    Closed,

    /// Write did not complete within the write deadline
    #[error("Write timed out")]
    Timeout,

    /// Underlying socket error
    #[error("Send failed: {0}")]
    Send(String),
}

/// Synchronization errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid credentials
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Unknown room code
    #[error("Room not found: {room_code}")]
    NotFound { room_code: RoomCode },

    /// Authenticated user does not belong to the room
    #[error("User {user_id} is not a member of room {room_code}")]
    NotMember { room_code: RoomCode, user_id: UserId },

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Socket failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Membership store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Whether admission failed after the point where the HTTP request can
    /// still be refused. Everything except bad credentials upgrades the
    /// socket and then closes it without a frame.
    pub fn closes_silently(&self) -> bool {
        !matches!(self, SyncError::Auth(_))
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            SyncError::Auth(e) => e.client_message(),
            SyncError::NotFound { .. } | SyncError::NotMember { .. } => {
                "Room not found".to_string()
            }
            SyncError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;
