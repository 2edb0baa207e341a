//! Identifier types shared by every synchronizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::SyncError;

/// User ID type
pub type UserId = i64;

/// Maximum accepted room code length
pub const MAX_ROOM_CODE_LEN: usize = 32;

/// Short code identifying a room.
///
/// This is the only room key used by registries, tables and store lookups.
/// Numeric database ids stay inside the store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse and validate a room code
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Validation` if the code is empty, too long, or
    /// contains characters other than ASCII alphanumerics, `-` and `_`.
    pub fn parse(raw: &str) -> Result<Self, SyncError> {
        if raw.is_empty() {
            return Err(SyncError::Validation("room code is empty".to_string()));
        }
        if raw.len() > MAX_ROOM_CODE_LEN {
            return Err(SyncError::Validation(format!(
                "room code longer than {} characters",
                MAX_ROOM_CODE_LEN
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SyncError::Validation(format!(
                "room code contains invalid characters: {}",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RoomCode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identity of one live socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
