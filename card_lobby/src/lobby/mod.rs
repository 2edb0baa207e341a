//! Room lobby synchronization.
//!
//! Lobby sockets see who is in the room, who is ready and who hosts. Any
//! change (connect, disconnect, ready toggles, or an external notification)
//! re-reads the member list and pushes a fresh `room_status` to the room.

mod synchronizer;

pub use synchronizer::{LobbySynchronizer, StatusBroadcast};
