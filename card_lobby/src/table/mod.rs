//! Betting tables.
//!
//! A table is created the first time anyone opens the table socket for a
//! room. Every member is seated with the configured starting chips, one of
//! them is drawn as dealer, and from then on `bet_update` commands move
//! chips between each player's stack and their bet.

mod registry;
mod state;
mod synchronizer;

pub use registry::TableRegistry;
pub use state::{BetOutcome, GameTable, PlayerBetState};
pub use synchronizer::TableSynchronizer;
