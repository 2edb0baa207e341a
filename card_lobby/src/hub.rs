//! Process-wide entry point for the synchronizers.

use std::sync::Arc;

use crate::{
    auth::TokenVerifier,
    config::SyncConfig,
    errors::{SyncError, SyncResult},
    ids::{RoomCode, UserId},
    lobby::LobbySynchronizer,
    registry::{Connection, FrameSink},
    store::{Room, RoomStatus, RoomStore},
    table::TableSynchronizer,
};

/// Owns the membership store, the token verifier and both synchronizers.
///
/// Socket handlers call [`SyncHub::admit`] before upgrading. HTTP actions
/// elsewhere in the system call the `notify_*` hooks after changing a room.
pub struct SyncHub {
    store: Arc<dyn RoomStore>,
    verifier: Arc<dyn TokenVerifier>,
    lobby: LobbySynchronizer,
    table: TableSynchronizer,
    config: SyncConfig,
}

impl SyncHub {
    pub fn new(
        store: Arc<dyn RoomStore>,
        verifier: Arc<dyn TokenVerifier>,
        config: SyncConfig,
    ) -> Self {
        Self {
            lobby: LobbySynchronizer::new(store.clone()),
            table: TableSynchronizer::new(store.clone(), &config),
            store,
            verifier,
            config,
        }
    }

    pub fn lobby(&self) -> &LobbySynchronizer {
        &self.lobby
    }

    pub fn table(&self) -> &TableSynchronizer {
        &self.table
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Authenticate `token` and check that its user belongs to `room_code`.
    ///
    /// Checks run in order: token, room code syntax, room existence,
    /// membership. A closed room reads as not found.
    pub async fn admit(&self, token: Option<&str>, room_code: &str) -> SyncResult<(UserId, Room)> {
        let user_id = self.verifier.verify(token.unwrap_or_default())?;

        let code = RoomCode::parse(room_code)?;

        let room = match self.store.room(&code).await? {
            Some(room) if room.status != RoomStatus::Closed => room,
            _ => return Err(SyncError::NotFound { room_code: code }),
        };

        if !self.store.is_member(&code, user_id).await? {
            return Err(SyncError::NotMember {
                room_code: code,
                user_id,
            });
        }

        Ok((user_id, room))
    }

    /// Wrap a socket's write half in a [`Connection`] using the configured
    /// write timeout
    pub fn connection(&self, user_id: UserId, sink: Box<dyn FrameSink>) -> Arc<Connection> {
        Arc::new(Connection::new(user_id, sink, self.config.write_timeout))
    }

    /// Membership or readiness changed outside the sockets
    pub async fn notify_room_changed(&self, room: &RoomCode) {
        self.lobby.refresh(room).await;
    }

    /// A round was created for the room
    pub async fn notify_game_started(&self, room: &RoomCode, game_id: i64) {
        if let Err(e) = self.lobby.broadcast_start_game(room, game_id).await {
            log::warn!("start_game broadcast for room {room} abandoned: {e}");
        }
    }

    /// `user_id` left or was removed from the room.
    ///
    /// Host reassignment has already happened in the store; the departing
    /// user's lobby sockets are closed and the rest of the room is refreshed.
    pub async fn notify_user_left(&self, room: &RoomCode, user_id: UserId) {
        let closed = self.lobby.close_user(room, user_id).await;
        log::info!("user {user_id} left room {room} ({closed} lobby connections closed)");
        self.lobby.refresh(room).await;
    }

    /// The room is gone: close every socket and forget its table
    pub async fn notify_room_closed(&self, room: &RoomCode) {
        let closed = self.lobby.close_room(room).await;
        self.table.close_room(room).await;
        log::info!("room {room} closed ({closed} lobby connections closed)");
    }
}
