use std::sync::Arc;

use tokio::task::JoinHandle;

use super::registry::TableRegistry;
use crate::{
    config::SyncConfig,
    countdown::{Countdown, spawn_countdown},
    errors::{SyncError, SyncResult},
    ids::{ConnectionId, RoomCode, UserId},
    protocol::{FrameOutcome, IgnoreReason, ServerFrame, TableCommand, parse_table_command},
    registry::{Connection, ConnectionRegistry},
    store::RoomStore,
};

/// Keeps every table socket of a room in sync with the room's betting table
pub struct TableSynchronizer {
    store: Arc<dyn RoomStore>,
    connections: ConnectionRegistry,
    tables: TableRegistry,
    starting_chips: i64,
    countdown: Countdown,
}

impl TableSynchronizer {
    pub fn new(store: Arc<dyn RoomStore>, config: &SyncConfig) -> Self {
        Self {
            store,
            connections: ConnectionRegistry::new("table"),
            tables: TableRegistry::new(config.dealer_seed),
            starting_chips: config.starting_chips,
            countdown: Countdown::from_config(config),
        }
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    /// Admit a connection to the room's table.
    ///
    /// Seats any member not yet at the table and draws the dealer if needed.
    /// The joiner alone receives `player_order`, then the whole room gets a
    /// fresh `bet_state`. Returns the joiner's countdown task.
    ///
    /// # Errors
    ///
    /// * `SyncError::NotFound` - the room has no members
    /// * `SyncError::Store` - the member list could not be loaded
    /// * `SyncError::Transport` - `player_order` could not be delivered
    pub async fn join(&self, room: &RoomCode, conn: Arc<Connection>) -> SyncResult<JoinHandle<()>> {
        let members = self.store.members(room).await?;
        if members.is_empty() {
            return Err(SyncError::NotFound {
                room_code: room.clone(),
            });
        }

        let table = self.tables.get_or_create(room).await;
        let (order, state) = {
            let mut table = table.lock().await;
            let seated = table.seat_members(&members, self.starting_chips);
            if seated > 0 {
                log::debug!("room {room}: seated {seated} new players");
            }
            table.ensure_dealer();
            (table.player_order(&members), table.bet_state())
        };

        self.connections.register(room, conn.clone()).await;
        log::info!(
            "table: user {} joined room {} ({})",
            conn.user_id(),
            room,
            conn.id()
        );

        if let Err(e) = conn.send_json(&order).await {
            self.connections.unregister(room, conn.id()).await;
            conn.close().await;
            return Err(e.into());
        }

        self.broadcast(room, &state).await;
        Ok(spawn_countdown(conn, self.countdown))
    }

    /// Handle one inbound table frame from `user_id`.
    ///
    /// Rejected frames change nothing and trigger no broadcast.
    pub async fn handle_frame(&self, room: &RoomCode, user_id: UserId, raw: &str) -> FrameOutcome {
        let command = match parse_table_command(raw) {
            Ok(command) => command,
            Err(reason) => return FrameOutcome::Ignored(reason),
        };
        let TableCommand::BetUpdate { bet, confirm } = command;

        let Some(table) = self.tables.get(room).await else {
            return FrameOutcome::Ignored(IgnoreReason::NoTable);
        };

        let (outcome, state) = {
            let mut table = table.lock().await;
            let outcome = table.apply_bet(user_id, bet, confirm);
            let state = outcome.is_applied().then(|| table.bet_state());
            (outcome, state)
        };

        if let Some(state) = state {
            log::debug!("room {room}: user {user_id} bet {bet} (confirm={confirm})");
            self.broadcast(room, &state).await;
        }
        outcome.into()
    }

    /// Drop a closed connection. The table itself stays.
    pub async fn leave(&self, room: &RoomCode, id: ConnectionId) {
        if let Some(conn) = self.connections.unregister(room, id).await {
            log::info!("table: user {} left room {} ({})", conn.user_id(), room, id);
        }
    }

    /// Close every table connection of the room and evict its table
    pub async fn close_room(&self, room: &RoomCode) {
        let closed = self.connections.drop_room(room).await;
        let evicted = self.tables.remove(room).await;
        log::info!("room {room}: closed {closed} table connections (table evicted: {evicted})");
    }

    async fn broadcast(&self, room: &RoomCode, frame: &ServerFrame) -> usize {
        match frame.to_json() {
            Ok(text) => self.connections.broadcast_text(room, &text).await,
            Err(e) => {
                log::error!("room {room}: failed to serialize frame: {e}");
                0
            }
        }
    }
}
