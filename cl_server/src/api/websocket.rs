//! WebSocket handlers for the lobby and betting table sockets.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /api/ws/room/{room_code}` (lobby) or
//!    `GET /api/ws/blackjackwebsocket/{room_code}` (table), with the access
//!    token as `Authorization: Bearer <jwt>` or `?token=<jwt>`
//! 2. The token is verified before anything else; failures get `401`
//! 3. Unknown rooms and non-members are upgraded and closed without a frame
//! 4. The socket is registered with its synchronizer, a pinger starts, and
//!    the read loop feeds inbound frames to the synchronizer
//! 5. When the read loop ends (close, error or read deadline) the socket is
//!    unregistered and its background tasks stop
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/api/ws/room/123456?token=eyJhbGc...');
//! ws.send(JSON.stringify({ room_code: "123456", is_ready: true }));
//! ```

use async_trait::async_trait;
use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use card_lobby::{
    FrameOutcome, IgnoreReason, RoomCode, TransportError, UserId, heartbeat::spawn_pinger,
    registry::FrameSink,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::time::timeout;

use super::{AppState, rate_limiter::FrameLimiter};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Which synchronizer a socket belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Lobby,
    Table,
}

impl SocketKind {
    pub fn label(self) -> &'static str {
        match self {
            SocketKind::Lobby => "lobby",
            SocketKind::Table => "table",
        }
    }
}

/// Write half of an axum WebSocket
struct WsSink(SplitSink<WebSocket, Message>);

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn send_ping(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.0
            .send(Message::Ping(payload.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.0
            .close()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// Token from `Authorization: Bearer <t>`, falling back to `?token=`.
///
/// A `Bearer` header takes precedence once present, even when it carries no
/// token.
pub fn extract_token(headers: &HeaderMap, query: WsQuery) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer"))
        .filter(|rest| rest.is_empty() || rest.starts_with(' '));

    match bearer {
        Some(rest) => Some(rest.trim().to_string()).filter(|token| !token.is_empty()),
        None => query.token,
    }
}

/// Lobby socket: membership, readiness and host status
pub async fn lobby_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Path(room_code): Path<String>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    admit_and_upgrade(ws, SocketKind::Lobby, room_code, extract_token(&headers, query), state).await
}

/// Table socket: seating, bets and countdown
pub async fn table_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Path(room_code): Path<String>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    admit_and_upgrade(ws, SocketKind::Table, room_code, extract_token(&headers, query), state).await
}

async fn admit_and_upgrade(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    kind: SocketKind,
    room_code: String,
    token: Option<String>,
    state: AppState,
) -> Response {
    let admission = state.hub.admit(token.as_deref(), &room_code).await;
    if let Err(e) = &admission
        && !e.closes_silently()
    {
        debug!("{}: refused connection to room {}: {}", kind.label(), room_code, e);
        return (StatusCode::UNAUTHORIZED, e.client_message()).into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    match admission {
        Ok((user_id, room)) => {
            let max_frame_bytes = state.hub.config().max_frame_bytes;
            ws.max_message_size(max_frame_bytes)
                .on_upgrade(move |socket| handle_socket(socket, kind, room.code, user_id, state))
        }
        Err(e) => {
            info!("{}: closing connection to room {}: {}", kind.label(), room_code, e);
            // Dropping the upgraded socket closes it without sending anything
            ws.on_upgrade(|_socket| async {})
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    kind: SocketKind,
    room: RoomCode,
    user_id: UserId,
    state: AppState,
) {
    let label = kind.label();
    let hub = &state.hub;
    let (sender, mut receiver) = socket.split();
    let conn = hub.connection(user_id, Box::new(WsSink(sender)));
    metrics::connection_opened(label);

    let countdown = match kind {
        SocketKind::Lobby => {
            hub.lobby().connect(&room, conn.clone()).await;
            None
        }
        SocketKind::Table => match hub.table().join(&room, conn.clone()).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                info!("table: user {user_id} could not join room {room}: {e}");
                conn.close().await;
                metrics::connection_closed(label);
                return;
            }
        },
    };

    let pinger = spawn_pinger(conn.clone(), hub.config().ping_interval);
    let read_timeout = hub.config().read_timeout;
    let mut limiter = FrameLimiter::per_connection();

    loop {
        let msg = match timeout(read_timeout, receiver.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(e))) => {
                debug!("{label}: read error for user {user_id} in room {room}: {e}");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                info!("{label}: read deadline passed for user {user_id} in room {room}");
                break;
            }
        };

        let raw = match &msg {
            Message::Text(text) => text.as_str(),
            Message::Binary(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    record_outcome(kind, FrameOutcome::Ignored(IgnoreReason::Malformed));
                    continue;
                }
            },
            Message::Close(_) => break,
            // Pings and pongs only refresh the read deadline
            _ => continue,
        };
        metrics::frame_received(label);

        if !limiter.check() {
            record_outcome(kind, FrameOutcome::Ignored(IgnoreReason::RateLimited));
            continue;
        }

        let outcome = match kind {
            SocketKind::Lobby => hub.lobby().handle_frame(&room, user_id, raw).await,
            SocketKind::Table => hub.table().handle_frame(&room, user_id, raw).await,
        };
        record_outcome(kind, outcome);

        // Pruned by a failed broadcast write
        if conn.is_closed() {
            break;
        }
    }

    pinger.abort();
    if let Some(countdown) = countdown {
        countdown.abort();
    }

    match kind {
        SocketKind::Lobby => hub.lobby().disconnect(&room, &conn).await,
        SocketKind::Table => hub.table().leave(&room, conn.id()).await,
    }
    conn.close().await;
    metrics::connection_closed(label);
}

fn record_outcome(kind: SocketKind, outcome: FrameOutcome) {
    match outcome {
        FrameOutcome::Applied => {
            if kind == SocketKind::Table {
                metrics::bet_applied();
            }
        }
        FrameOutcome::Ignored(reason) => {
            if reason == IgnoreReason::StoreFailure {
                warn!("{}: frame dropped after store failure", kind.label());
            } else {
                debug!("{}: ignored frame ({})", kind.label(), reason.as_str());
            }
            metrics::frame_ignored(kind.label(), reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        let query = WsQuery {
            token: Some("query-token".to_string()),
        };

        assert_eq!(
            extract_token(&headers, query).as_deref(),
            Some("header-token")
        );
    }

    #[test]
    fn test_query_token_fallback() {
        let query = WsQuery {
            token: Some("query-token".to_string()),
        };
        assert_eq!(
            extract_token(&HeaderMap::new(), query).as_deref(),
            Some("query-token")
        );
    }

    #[test]
    fn test_empty_bearer_header_does_not_fall_back() {
        let query = || WsQuery {
            token: Some("query-token".to_string()),
        };

        for value in ["Bearer ", "Bearer"] {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
            assert_eq!(extract_token(&headers, query()), None);
        }
    }

    #[test]
    fn test_non_bearer_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&headers, WsQuery::default()), None);
    }

    #[test]
    fn test_socket_labels() {
        assert_eq!(SocketKind::Lobby.label(), "lobby");
        assert_eq!(SocketKind::Table.label(), "table");
    }
}
