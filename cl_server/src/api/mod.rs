//! HTTP/WebSocket API for the lobby server.
//!
//! # Endpoints
//!
//! ```text
//! GET /health                                   - Health check (public)
//! GET /api/ws/room/{room_code}                  - Lobby socket (auth required)
//! GET /api/ws/blackjackwebsocket/{room_code}    - Table socket (auth required)
//! ```
//!
//! Both sockets accept the access token as `Authorization: Bearer <jwt>` or
//! as the `token` query parameter.
//!
//! # CORS
//!
//! CORS is configured permissively. In production, configure appropriate
//! origins, methods, and headers.

pub mod rate_limiter;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use card_lobby::{SyncHub, db::Database};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<SyncHub>,
    /// `None` when running on the in-memory store
    pub database: Option<Database>,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/ws/room/{room_code}", get(websocket::lobby_handler))
        .route(
            "/api/ws/blackjackwebsocket/{room_code}",
            get(websocket::table_handler),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the membership database answers (or no database is
/// configured), `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","database":true,"tables":0,"timestamp":"2026-10-18T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match &state.database {
        Some(db) => db.health_check().await.is_ok(),
        None => true,
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "tables": state.hub.table().tables().len().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
