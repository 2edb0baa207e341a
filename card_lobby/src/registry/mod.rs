//! Per-room sets of live connections.
//!
//! One [`ConnectionRegistry`] exists per socket kind (lobby and table). The
//! map lock is held only while the map itself changes; every network write
//! happens on a snapshot taken beforehand.

mod connection;
mod sink;

pub use connection::Connection;
pub use sink::{ChannelSink, Frame, FrameSink};

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::ids::{ConnectionId, RoomCode, UserId};

type RoomConnections = HashMap<ConnectionId, Arc<Connection>>;

#[derive(Debug)]
pub struct ConnectionRegistry {
    name: &'static str,
    rooms: RwLock<HashMap<RoomCode, RoomConnections>>,
}

impl ConnectionRegistry {
    /// `name` labels logs and metrics, e.g. `"lobby"` or `"table"`
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn register(&self, room: &RoomCode, conn: Arc<Connection>) {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.clone())
            .or_default()
            .insert(conn.id(), conn);
    }

    /// Remove a connection. The room entry goes away with its last connection.
    pub async fn unregister(&self, room: &RoomCode, id: ConnectionId) -> Option<Arc<Connection>> {
        let mut rooms = self.rooms.write().await;
        let conns = rooms.get_mut(room)?;
        let removed = conns.remove(&id);
        if conns.is_empty() {
            rooms.remove(room);
        }
        removed
    }

    /// Point-in-time copy of a room's connections
    pub async fn snapshot(&self, room: &RoomCode) -> Vec<Arc<Connection>> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room)
            .map(|conns| conns.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove and close connections whose last write failed.
    ///
    /// A connection already removed by someone else is skipped, so each
    /// connection is closed at most once. Returns how many were removed.
    pub async fn prune_failed(&self, room: &RoomCode, failed: &[ConnectionId]) -> usize {
        if failed.is_empty() {
            return 0;
        }

        let removed: Vec<Arc<Connection>> = {
            let mut rooms = self.rooms.write().await;
            let Some(conns) = rooms.get_mut(room) else {
                return 0;
            };
            let removed = failed.iter().filter_map(|id| conns.remove(id)).collect();
            if conns.is_empty() {
                rooms.remove(room);
            }
            removed
        };

        for conn in &removed {
            log::warn!(
                "{}: pruning connection {} of user {} in room {}",
                self.name,
                conn.id(),
                conn.user_id(),
                room
            );
            conn.close().await;
        }
        if !removed.is_empty() {
            metrics::counter!("connections_pruned_total", "socket" => self.name)
                .increment(removed.len() as u64);
        }
        removed.len()
    }

    /// Remove and close every connection `user_id` holds in `room`
    pub async fn close_user(&self, room: &RoomCode, user_id: UserId) -> usize {
        let removed: Vec<Arc<Connection>> = {
            let mut rooms = self.rooms.write().await;
            let Some(conns) = rooms.get_mut(room) else {
                return 0;
            };
            let ids: Vec<ConnectionId> = conns
                .values()
                .filter(|conn| conn.user_id() == user_id)
                .map(|conn| conn.id())
                .collect();
            let removed = ids.iter().filter_map(|id| conns.remove(id)).collect();
            if conns.is_empty() {
                rooms.remove(room);
            }
            removed
        };

        for conn in &removed {
            conn.close().await;
        }
        removed.len()
    }

    /// Remove and close every connection of `room`
    pub async fn drop_room(&self, room: &RoomCode) -> usize {
        let removed = self.rooms.write().await.remove(room);
        let Some(conns) = removed else {
            return 0;
        };
        for conn in conns.values() {
            conn.close().await;
        }
        conns.len()
    }

    /// Send `text` to every connection in `room`, pruning the ones that fail.
    ///
    /// Returns the number of successful deliveries.
    pub async fn broadcast_text(&self, room: &RoomCode, text: &str) -> usize {
        let targets = self.snapshot(room).await;
        self.send_to(room, &targets, text).await
    }

    /// Send `text` to the given connections, pruning the ones that fail
    pub async fn send_to(&self, room: &RoomCode, targets: &[Arc<Connection>], text: &str) -> usize {
        let mut failed = Vec::new();
        for conn in targets {
            if let Err(e) = conn.send_text(text.to_string()).await {
                log::debug!("{}: write to {} failed: {e}", self.name, conn.id());
                failed.push(conn.id());
            }
        }
        let delivered = targets.len() - failed.len();
        self.prune_failed(room, &failed).await;
        delivered
    }

    /// Number of connections in `room`
    pub async fn len(&self, room: &RoomCode) -> usize {
        self.rooms.read().await.get(room).map_or(0, HashMap::len)
    }

    /// True when no room has any connection
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Number of rooms with at least one connection
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
