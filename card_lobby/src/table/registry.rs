use std::{collections::HashMap, sync::Arc};

use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{Mutex, RwLock};

use super::state::GameTable;
use crate::ids::RoomCode;

/// Lazily created betting tables keyed by room code.
///
/// Each table sits behind its own mutex so that bets in different rooms
/// never contend. Tables stay alive until [`TableRegistry::remove`] is
/// called for their room.
#[derive(Debug)]
pub struct TableRegistry {
    tables: RwLock<HashMap<RoomCode, Arc<Mutex<GameTable>>>>,
    dealer_seed: Option<u64>,
}

impl TableRegistry {
    pub fn new(dealer_seed: Option<u64>) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            dealer_seed,
        }
    }

    pub async fn get(&self, room: &RoomCode) -> Option<Arc<Mutex<GameTable>>> {
        self.tables.read().await.get(room).cloned()
    }

    /// Return the room's table, creating an empty one on first use
    pub async fn get_or_create(&self, room: &RoomCode) -> Arc<Mutex<GameTable>> {
        if let Some(table) = self.get(room).await {
            return table;
        }

        let mut tables = self.tables.write().await;
        tables
            .entry(room.clone())
            .or_insert_with(|| {
                log::info!("room {room}: table created");
                Arc::new(Mutex::new(GameTable::new(room.clone(), self.rng_for(room))))
            })
            .clone()
    }

    /// Drop the room's table. Returns whether one existed.
    pub async fn remove(&self, room: &RoomCode) -> bool {
        self.tables.write().await.remove(room).is_some()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.is_empty()
    }

    fn rng_for(&self, room: &RoomCode) -> StdRng {
        match self.dealer_seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ fnv1a(room.as_str().as_bytes())),
            None => StdRng::from_os_rng(),
        }
    }
}

/// 64-bit FNV-1a, stable across runs and platforms
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}
