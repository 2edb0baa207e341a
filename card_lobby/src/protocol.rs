//! JSON frames exchanged over the lobby and table sockets.
//!
//! Every outbound frame is a [`ServerFrame`], serialized with a `type` tag:
//!
//! ```json
//! {"type":"room_status","room_code":"123456","players":[...],"max_players":4}
//! {"type":"bet_state","room_code":"123456","players":[...],"all_confirmed":false}
//! {"type":"timer","remaining":14.9}
//! ```
//!
//! Inbound frames that fail to parse are never answered; callers receive a
//! [`FrameOutcome::Ignored`] carrying the reason for diagnostics.

use serde::{Deserialize, Serialize};

use crate::ids::{RoomCode, UserId};

/// Per-member entry of `room_status` and `player_order`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub user_id: UserId,
    pub name: String,
    pub is_ready: bool,
    pub is_host: bool,
    pub is_dealer: bool,
}

/// Per-player entry of `bet_state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetPlayer {
    pub user_id: UserId,
    pub name: String,
    pub bet: i64,
    pub confirmed: bool,
    pub total_chips: i64,
}

/// Frames sent from server to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Membership, readiness and host flags for the whole room
    RoomStatus {
        room_code: RoomCode,
        players: Vec<PlayerInfo>,
        max_players: usize,
    },

    /// Sent to the host only, once every member is ready
    AllReady { room_code: RoomCode, all_ready: bool },

    /// Round created by the room service
    StartGame { room_code: RoomCode, game_id: i64 },

    /// Seating and dealer flags, sent to a joining table connection only
    PlayerOrder { players: Vec<PlayerInfo> },

    /// Bets, confirmations and chip balances for the whole table
    BetState {
        room_code: RoomCode,
        players: Vec<BetPlayer>,
        all_confirmed: bool,
    },

    /// Countdown tick, seconds remaining
    Timer { remaining: f64 },
}

impl ServerFrame {
    /// Serialize to the JSON text sent on the wire
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Lobby socket inbound frame.
///
/// `room_code` is accepted for compatibility but never trusted; the code
/// from the socket path wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadyUpdate {
    #[serde(default)]
    pub room_code: Option<String>,
    pub is_ready: bool,
}

/// Table socket inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableCommand {
    BetUpdate {
        bet: i64,
        #[serde(default)]
        confirm: bool,
    },
}

/// Known `type` tags of [`TableCommand`]
const TABLE_COMMAND_TYPES: &[&str] = &["bet_update"];

/// Why an inbound frame produced no state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IgnoreReason {
    /// Not JSON or missing/mistyped fields
    Malformed,
    /// Valid JSON with an unrecognised `type`
    UnknownType,
    /// The dealer tried to bet
    DealerBet,
    NegativeBet,
    /// Raise larger than the remaining chips
    InsufficientChips,
    /// Sender has no seat at the table
    UnknownPlayer,
    /// No table exists for the room
    NoTable,
    /// Membership store rejected the update
    StoreFailure,
    /// Sender exceeded the inbound frame rate
    RateLimited,
}

impl IgnoreReason {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::Malformed => "malformed",
            IgnoreReason::UnknownType => "unknown_type",
            IgnoreReason::DealerBet => "dealer_bet",
            IgnoreReason::NegativeBet => "negative_bet",
            IgnoreReason::InsufficientChips => "insufficient_chips",
            IgnoreReason::UnknownPlayer => "unknown_player",
            IgnoreReason::NoTable => "no_table",
            IgnoreReason::StoreFailure => "store_failure",
            IgnoreReason::RateLimited => "rate_limited",
        }
    }
}

/// Result of handling one inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// State changed and a broadcast was issued
    Applied,
    /// Frame dropped without a reply
    Ignored(IgnoreReason),
}

impl FrameOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FrameOutcome::Applied)
    }
}

/// Parse a lobby frame
pub fn parse_ready_update(raw: &str) -> Result<ReadyUpdate, IgnoreReason> {
    serde_json::from_str(raw).map_err(|_| IgnoreReason::Malformed)
}

/// Parse a table frame, telling unknown message types apart from garbage
pub fn parse_table_command(raw: &str) -> Result<TableCommand, IgnoreReason> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| IgnoreReason::Malformed)?;

    let Some(kind) = value.get("type").and_then(|t| t.as_str()) else {
        return Err(IgnoreReason::Malformed);
    };
    if !TABLE_COMMAND_TYPES.contains(&kind) {
        return Err(IgnoreReason::UnknownType);
    }

    serde_json::from_value(value).map_err(|_| IgnoreReason::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code() -> RoomCode {
        RoomCode::parse("123456").unwrap()
    }

    #[test]
    fn test_room_status_wire_shape() {
        let frame = ServerFrame::RoomStatus {
            room_code: code(),
            players: vec![PlayerInfo {
                user_id: 1,
                name: "alice".to_string(),
                is_ready: true,
                is_host: true,
                is_dealer: false,
            }],
            max_players: 4,
        };

        let value: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "room_status",
                "room_code": "123456",
                "players": [{
                    "user_id": 1,
                    "name": "alice",
                    "is_ready": true,
                    "is_host": true,
                    "is_dealer": false
                }],
                "max_players": 4
            })
        );
    }

    #[test]
    fn test_all_ready_and_timer_wire_shape() {
        let all_ready = serde_json::to_value(ServerFrame::AllReady {
            room_code: code(),
            all_ready: true,
        })
        .unwrap();
        assert_eq!(
            all_ready,
            json!({"type": "all_ready", "room_code": "123456", "all_ready": true})
        );

        let timer = serde_json::to_value(ServerFrame::Timer { remaining: 14.9 }).unwrap();
        assert_eq!(timer, json!({"type": "timer", "remaining": 14.9}));
    }

    #[test]
    fn test_bet_state_wire_shape() {
        let value = serde_json::to_value(ServerFrame::BetState {
            room_code: code(),
            players: vec![BetPlayer {
                user_id: 2,
                name: "bob".to_string(),
                bet: 300,
                confirmed: true,
                total_chips: 700,
            }],
            all_confirmed: true,
        })
        .unwrap();

        assert_eq!(value["type"], "bet_state");
        assert_eq!(value["players"][0]["total_chips"], 700);
        assert_eq!(value["all_confirmed"], true);
    }

    #[test]
    fn test_parse_bet_update() {
        let cmd = parse_table_command(r#"{"type":"bet_update","bet":300,"confirm":true}"#).unwrap();
        assert_eq!(
            cmd,
            TableCommand::BetUpdate {
                bet: 300,
                confirm: true
            }
        );

        // confirm defaults to false
        let cmd = parse_table_command(r#"{"type":"bet_update","bet":5}"#).unwrap();
        assert_eq!(
            cmd,
            TableCommand::BetUpdate {
                bet: 5,
                confirm: false
            }
        );
    }

    #[test]
    fn test_parse_table_command_rejections() {
        assert_eq!(
            parse_table_command("not json"),
            Err(IgnoreReason::Malformed)
        );
        assert_eq!(
            parse_table_command(r#"{"bet":1}"#),
            Err(IgnoreReason::Malformed)
        );
        assert_eq!(
            parse_table_command(r#"{"type":"hit"}"#),
            Err(IgnoreReason::UnknownType)
        );
        assert_eq!(
            parse_table_command(r#"{"type":"bet_update","bet":"lots"}"#),
            Err(IgnoreReason::Malformed)
        );
    }

    #[test]
    fn test_parse_ready_update() {
        let update = parse_ready_update(r#"{"room_code":"999999","is_ready":true}"#).unwrap();
        assert!(update.is_ready);
        assert_eq!(update.room_code.as_deref(), Some("999999"));

        let update = parse_ready_update(r#"{"is_ready":false}"#).unwrap();
        assert!(update.room_code.is_none());

        assert_eq!(parse_ready_update("{}"), Err(IgnoreReason::Malformed));
    }
}
