//! Process-local membership store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{
    RoomStore,
    errors::{StoreError, StoreResult},
    models::{Member, Room, RoomStatus},
};
use crate::ids::{RoomCode, UserId};

#[derive(Debug, Clone)]
struct MemberRow {
    user_id: UserId,
    name: String,
    is_ready: bool,
}

#[derive(Debug, Clone)]
struct RoomEntry {
    room: Room,
    /// Join order
    members: Vec<MemberRow>,
}

/// In-memory `RoomStore` used by tests and `--memory` development mode
#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: RwLock<HashMap<RoomCode, RoomEntry>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a room with no members
    pub async fn create_room(&self, room: Room) {
        let mut rooms = self.rooms.write().await;
        rooms.insert(
            room.code.clone(),
            RoomEntry {
                room,
                members: Vec::new(),
            },
        );
    }

    /// Append a member in join order; re-adding an existing member is a no-op
    pub async fn add_member(&self, code: &RoomCode, user_id: UserId, name: &str) -> StoreResult<()> {
        let mut rooms = self.rooms.write().await;
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;

        if !entry.members.iter().any(|m| m.user_id == user_id) {
            entry.members.push(MemberRow {
                user_id,
                name: name.to_string(),
                is_ready: false,
            });
        }
        Ok(())
    }

    /// Remove a member, returning whether a row was deleted
    pub async fn remove_member(&self, code: &RoomCode, user_id: UserId) -> StoreResult<bool> {
        let mut rooms = self.rooms.write().await;
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;

        let before = entry.members.len();
        entry.members.retain(|m| m.user_id != user_id);
        Ok(entry.members.len() != before)
    }

    pub async fn set_owner(&self, code: &RoomCode, owner_id: UserId) -> StoreResult<()> {
        let mut rooms = self.rooms.write().await;
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;
        entry.room.owner_id = owner_id;
        Ok(())
    }

    pub async fn set_status(&self, code: &RoomCode, status: RoomStatus) -> StoreResult<()> {
        let mut rooms = self.rooms.write().await;
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;
        entry.room.status = status;
        Ok(())
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn room(&self, code: &RoomCode) -> StoreResult<Option<Room>> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(code).map(|entry| entry.room.clone()))
    }

    async fn members(&self, code: &RoomCode) -> StoreResult<Vec<Member>> {
        let rooms = self.rooms.read().await;
        let Some(entry) = rooms.get(code) else {
            return Ok(Vec::new());
        };

        let owner_id = entry.room.owner_id;
        let mut members: Vec<Member> = entry
            .members
            .iter()
            .map(|row| Member {
                user_id: row.user_id,
                name: row.name.clone(),
                is_ready: row.is_ready,
                is_host: row.user_id == owner_id,
            })
            .collect();

        // Stable sort keeps join order among non-hosts
        members.sort_by_key(|m| !m.is_host);
        Ok(members)
    }

    async fn set_ready(&self, code: &RoomCode, user_id: UserId, ready: bool) -> StoreResult<()> {
        let mut rooms = self.rooms.write().await;
        let entry = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound(code.clone()))?;

        if let Some(row) = entry.members.iter_mut().find(|m| m.user_id == user_id) {
            row.is_ready = ready;
        }
        Ok(())
    }

    async fn is_member(&self, code: &RoomCode, user_id: UserId) -> StoreResult<bool> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .get(code)
            .is_some_and(|entry| entry.members.iter().any(|m| m.user_id == user_id)))
    }
}
