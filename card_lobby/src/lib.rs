//! # Card Lobby
//!
//! Real-time synchronization of room lobbies and betting tables for a
//! multiplayer card game.
//!
//! Clients hold two kinds of persistent sockets per room:
//!
//! - **Lobby** sockets receive `room_status` whenever membership or readiness
//!   changes, and the host additionally receives `all_ready` once every
//!   member is ready.
//! - **Table** sockets receive the betting table: seating and dealer
//!   (`player_order`), bets and chip stacks (`bet_state`) and a countdown
//!   (`timer`).
//!
//! ## Core Modules
//!
//! - [`registry`]: per-room connection sets with serialized writes
//! - [`lobby`]: room status broadcasts
//! - [`table`]: betting tables, dealer selection and bet accounting
//! - [`heartbeat`] / [`countdown`]: per-connection background tasks
//! - [`hub`]: admission and hooks for the rest of the system
//!
//! Rooms and members live in an external store reached through
//! [`store::RoomStore`]; tokens are checked through [`auth::TokenVerifier`].
//!
//! ## Example
//!
//! ```
//! use card_lobby::{RoomCode, table::GameTable};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut table = GameTable::new(RoomCode::parse("123456").unwrap(), StdRng::seed_from_u64(1));
//! table.seat_player(1, "alice", 1000);
//! table.seat_player(2, "bob", 1000);
//! let dealer = table.ensure_dealer().unwrap();
//! let player = if dealer == 1 { 2 } else { 1 };
//!
//! assert!(table.apply_bet(player, 300, true).is_applied());
//! assert_eq!(table.player(player).unwrap().total_chips, 700);
//! assert!(table.all_confirmed());
//! ```

pub mod auth;
pub mod config;
pub mod countdown;
pub mod db;
pub mod errors;
pub mod heartbeat;
pub mod hub;
pub mod ids;
pub mod lobby;
pub mod protocol;
pub mod registry;
pub mod store;
pub mod table;

pub use config::{ConfigError, SyncConfig};
pub use errors::{SyncError, SyncResult, TransportError};
pub use hub::SyncHub;
pub use ids::{ConnectionId, RoomCode, UserId};
pub use protocol::{FrameOutcome, IgnoreReason, ServerFrame};
