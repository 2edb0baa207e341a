//! PostgreSQL implementation of `RoomStore`.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::{
    RoomStore,
    errors::StoreResult,
    models::{Member, Room, RoomStatus},
};
use crate::ids::{RoomCode, UserId};

/// Room membership backed by the `rooms`, `room_users` and `users` tables
pub struct PgRoomStore {
    pool: PgPool,
}

impl PgRoomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomStore for PgRoomStore {
    async fn room(&self, code: &RoomCode) -> StoreResult<Option<Room>> {
        let row = sqlx::query(
            "SELECT room_code, status, max_players, owner_id FROM rooms WHERE room_code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Room {
            code: code.clone(),
            status: RoomStatus::from_db(r.get::<String, _>("status").as_str()),
            max_players: r.get::<i32, _>("max_players").max(0) as usize,
            owner_id: r.get("owner_id"),
        }))
    }

    async fn members(&self, code: &RoomCode) -> StoreResult<Vec<Member>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id AS user_id,
                   u.name AS user_name,
                   ru.is_ready,
                   (ru.user_id = r.owner_id) AS is_host
            FROM room_users ru
            INNER JOIN users u ON ru.user_id = u.id
            INNER JOIN rooms r ON ru.room_id = r.id
            WHERE r.room_code = $1
            ORDER BY is_host DESC, ru.id ASC
            "#,
        )
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Member {
                user_id: r.get("user_id"),
                name: r.get("user_name"),
                is_ready: r.get("is_ready"),
                is_host: r.get("is_host"),
            })
            .collect())
    }

    async fn set_ready(&self, code: &RoomCode, user_id: UserId, ready: bool) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE room_users ru
            SET is_ready = $1
            FROM rooms r
            WHERE ru.room_id = r.id AND r.room_code = $2 AND ru.user_id = $3
            "#,
        )
        .bind(ready)
        .bind(code.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_member(&self, code: &RoomCode, user_id: UserId) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present
            FROM room_users ru
            INNER JOIN rooms r ON ru.room_id = r.id
            WHERE r.room_code = $1 AND ru.user_id = $2
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }
}
