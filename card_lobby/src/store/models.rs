//! Membership data models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{RoomCode, UserId};

/// Lifecycle of a room as recorded by the room service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Closed,
}

impl RoomStatus {
    /// Parse the stored status column; unknown values read as `Waiting`
    pub fn from_db(raw: &str) -> Self {
        match raw {
            "playing" => RoomStatus::Playing,
            "closed" => RoomStatus::Closed,
            _ => RoomStatus::Waiting,
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomStatus::Waiting => write!(f, "waiting"),
            RoomStatus::Playing => write!(f, "playing"),
            RoomStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Room record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub code: RoomCode,
    pub status: RoomStatus,
    pub max_players: usize,
    pub owner_id: UserId,
}

/// One member of a room as seen by the lobby
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: UserId,
    pub name: String,
    pub is_ready: bool,
    pub is_host: bool,
}
