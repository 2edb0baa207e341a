use std::sync::Arc;

use crate::{
    errors::{SyncError, SyncResult},
    ids::{RoomCode, UserId},
    protocol::{FrameOutcome, IgnoreReason, PlayerInfo, ServerFrame, parse_ready_update},
    registry::{Connection, ConnectionRegistry},
    store::{Member, RoomStore},
};

/// What a `room_status` broadcast did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusBroadcast {
    /// Connections that received `room_status`
    pub delivered: usize,
    /// Host connections that also received `all_ready`
    pub all_ready_sent: usize,
}

pub struct LobbySynchronizer {
    store: Arc<dyn RoomStore>,
    connections: ConnectionRegistry,
}

impl LobbySynchronizer {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self {
            store,
            connections: ConnectionRegistry::new("lobby"),
        }
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Register a lobby connection and show the room to everyone
    pub async fn connect(&self, room: &RoomCode, conn: Arc<Connection>) {
        log::info!(
            "lobby: user {} joined room {} ({})",
            conn.user_id(),
            room,
            conn.id()
        );
        self.connections.register(room, conn).await;
        self.refresh(room).await;
    }

    /// Tear down a lobby connection.
    ///
    /// The user is marked not ready before the connection is dropped, so
    /// peers see the change in the broadcast that follows. A store failure
    /// is logged and cleanup continues.
    pub async fn disconnect(&self, room: &RoomCode, conn: &Connection) {
        if let Err(e) = self.store.set_ready(room, conn.user_id(), false).await {
            log::warn!(
                "lobby: failed to clear ready flag of user {} in room {}: {e}",
                conn.user_id(),
                room
            );
        }
        self.connections.unregister(room, conn.id()).await;
        log::info!(
            "lobby: user {} left room {} ({})",
            conn.user_id(),
            room,
            conn.id()
        );
        self.refresh(room).await;
    }

    /// Handle one inbound lobby frame from `user_id`.
    ///
    /// Any `room_code` in the frame is ignored; `room` comes from the socket.
    pub async fn handle_frame(&self, room: &RoomCode, user_id: UserId, raw: &str) -> FrameOutcome {
        let update = match parse_ready_update(raw) {
            Ok(update) => update,
            Err(reason) => return FrameOutcome::Ignored(reason),
        };

        if let Err(e) = self.store.set_ready(room, user_id, update.is_ready).await {
            log::warn!("lobby: set_ready failed for user {user_id} in room {room}: {e}");
            return FrameOutcome::Ignored(IgnoreReason::StoreFailure);
        }

        self.refresh(room).await;
        FrameOutcome::Applied
    }

    /// Broadcast, logging instead of failing
    pub async fn refresh(&self, room: &RoomCode) {
        if let Err(e) = self.broadcast_room_status(room).await {
            log::warn!("lobby: status broadcast for room {room} abandoned: {e}");
        }
    }

    /// Send `room_status` to the room, plus `all_ready` to the host once
    /// every member is ready.
    ///
    /// Nothing is read from the store when the room has no connections.
    /// Connections whose write fails are pruned; the rest still get the
    /// frame.
    pub async fn broadcast_room_status(&self, room: &RoomCode) -> SyncResult<StatusBroadcast> {
        let targets = self.connections.snapshot(room).await;
        if targets.is_empty() {
            return Ok(StatusBroadcast::default());
        }

        let info = self
            .store
            .room(room)
            .await?
            .ok_or_else(|| SyncError::NotFound {
                room_code: room.clone(),
            })?;
        let members = self.store.members(room).await?;

        let all_ready = !members.is_empty() && members.iter().all(|m| m.is_ready);
        let host_id = members.iter().find(|m| m.is_host).map(|m| m.user_id);

        let status = ServerFrame::RoomStatus {
            room_code: room.clone(),
            players: members.iter().map(player_info).collect(),
            max_players: info.max_players,
        };
        let delivered = self
            .connections
            .send_to(room, &targets, &to_json(&status)?)
            .await;

        let mut all_ready_sent = 0;
        if let (true, Some(host_id)) = (all_ready, host_id) {
            let hosts: Vec<Arc<Connection>> = targets
                .into_iter()
                .filter(|conn| conn.user_id() == host_id && !conn.is_closed())
                .collect();
            let frame = ServerFrame::AllReady {
                room_code: room.clone(),
                all_ready: true,
            };
            all_ready_sent = self
                .connections
                .send_to(room, &hosts, &to_json(&frame)?)
                .await;
        }

        Ok(StatusBroadcast {
            delivered,
            all_ready_sent,
        })
    }

    /// Tell the room that a round has started
    pub async fn broadcast_start_game(&self, room: &RoomCode, game_id: i64) -> SyncResult<usize> {
        let frame = ServerFrame::StartGame {
            room_code: room.clone(),
            game_id,
        };
        let delivered = self
            .connections
            .broadcast_text(room, &to_json(&frame)?)
            .await;
        log::info!("lobby: game {game_id} started in room {room} ({delivered} notified)");
        Ok(delivered)
    }

    /// Close every lobby connection `user_id` holds in `room`
    pub async fn close_user(&self, room: &RoomCode, user_id: UserId) -> usize {
        self.connections.close_user(room, user_id).await
    }

    /// Close every lobby connection of `room`
    pub async fn close_room(&self, room: &RoomCode) -> usize {
        self.connections.drop_room(room).await
    }
}

fn player_info(member: &Member) -> PlayerInfo {
    PlayerInfo {
        user_id: member.user_id,
        name: member.name.clone(),
        is_ready: member.is_ready,
        is_host: member.is_host,
        is_dealer: false,
    }
}

fn to_json(frame: &ServerFrame) -> SyncResult<String> {
    frame
        .to_json()
        .map_err(|e| SyncError::Validation(format!("unserializable frame: {e}")))
}
