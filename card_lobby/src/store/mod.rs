//! Room membership collaborator.
//!
//! Rooms and their members are owned by the durable room service. The
//! synchronizers only read rooms, list members and flip readiness through
//! the [`RoomStore`] trait. Two adapters ship with the crate:
//!
//! - [`PgRoomStore`]: PostgreSQL via sqlx
//! - [`InMemoryRoomStore`]: process-local store for tests and development

pub mod errors;
pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

pub use errors::{StoreError, StoreResult};
pub use memory::InMemoryRoomStore;
pub use models::{Member, Room, RoomStatus};
pub use postgres::PgRoomStore;

use crate::ids::{RoomCode, UserId};

/// Trait for room membership operations
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Find room by code
    async fn room(&self, code: &RoomCode) -> StoreResult<Option<Room>>;

    /// List members, host first, then in join order
    async fn members(&self, code: &RoomCode) -> StoreResult<Vec<Member>>;

    /// Update a member's readiness flag
    async fn set_ready(&self, code: &RoomCode, user_id: UserId, ready: bool) -> StoreResult<()>;

    /// Check whether the user belongs to the room
    async fn is_member(&self, code: &RoomCode, user_id: UserId) -> StoreResult<bool>;
}
