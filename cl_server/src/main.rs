//! Lobby and betting table WebSocket server.
//!
//! Serves the lobby and table sockets on top of a shared `SyncHub`, backed
//! by PostgreSQL or, for local development, an in-memory store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use card_lobby::{
    RoomCode, SyncHub,
    auth::JwtVerifier,
    db::Database,
    store::{InMemoryRoomStore, PgRoomStore, Room, RoomStatus, RoomStore},
};
use cl_server::{
    api,
    config::{ServerConfig, StoreBackend},
    metrics,
};
use log::{info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Run the card lobby WebSocket server

USAGE:
  cl_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  --memory                 Use an in-memory store with a demo room instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT verification secret (required, 32+ chars)
  METRICS_BIND             Prometheus listener address (optional)
  STARTING_CHIPS           Chips per player at a new table [default: 1000]
  PING_INTERVAL_SECS       Keepalive ping interval [default: 30]
  READ_TIMEOUT_SECS        Idle time before a socket is dropped [default: 180]
  WRITE_TIMEOUT_SECS       Per-write deadline [default: 5]
  COUNTDOWN_SECS           Table countdown start [default: 15]
  COUNTDOWN_TICK_MS        Table countdown tick [default: 100]
  MAX_FRAME_BYTES          Largest inbound frame [default: 52428800]
  DEALER_SEED              Fixed seed for dealer selection (testing)
";

/// Code of the room created in `--memory` mode
const DEMO_ROOM: &str = "123456";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let memory = pargs.contains("--memory");
    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(bind, database_url, memory)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics at http://{addr}/metrics");
    }

    let (store, database): (Arc<dyn RoomStore>, Option<Database>) = match &config.store {
        StoreBackend::Postgres(db_config) => {
            info!("Connecting to database");
            let db = Database::connect(db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            info!("Database connected successfully");
            (Arc::new(PgRoomStore::new(db.pool().clone())), Some(db))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; rooms are lost on restart");
            (Arc::new(demo_store().await?), None)
        }
    };

    let hub = Arc::new(SyncHub::new(
        store,
        Arc::new(JwtVerifier::new(&config.jwt_secret)),
        config.sync.clone(),
    ));

    let app = api::create_router(api::AppState { hub, database });

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// In-memory store holding one waiting room owned by user 1, with users 1
/// and 2 as members
async fn demo_store() -> Result<InMemoryRoomStore, Error> {
    let store = InMemoryRoomStore::new();
    let code = RoomCode::parse(DEMO_ROOM)?;
    store
        .create_room(Room {
            code: code.clone(),
            status: RoomStatus::Waiting,
            max_players: 4,
            owner_id: 1,
        })
        .await;
    store.add_member(&code, 1, "player1").await?;
    store.add_member(&code, 2, "player2").await?;
    info!("Demo room {DEMO_ROOM} created with users 1 and 2");
    Ok(store)
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
