//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use card_lobby::{ConfigError, SyncConfig, db::DatabaseConfig};
use std::net::{Ipv4Addr, SocketAddr};

/// Address used when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
    6969,
);

/// Minimum accepted `JWT_SECRET` length
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Where room membership is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(DatabaseConfig),
    /// Process-local store seeded with a demo room
    Memory,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Membership store
    pub store: StoreBackend,
    /// JWT verification secret (required)
    pub jwt_secret: String,
    /// Prometheus listener; metrics are off when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Synchronizer tunables
    pub sync: SyncConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `memory` - Use the in-memory store instead of PostgreSQL
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or(DEFAULT_BIND);

        let store = if memory {
            StoreBackend::Memory
        } else {
            let database_url = database_url_override
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .ok_or_else(|| ConfigError::MissingRequired {
                    var: "DATABASE_URL".to_string(),
                    hint: "Set a PostgreSQL URL or pass --memory for a local store".to_string(),
                })?;
            StoreBackend::Postgres(DatabaseConfig::with_url(database_url))
        };

        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use the same secret as the account service".to_string(),
        })?;

        let metrics_bind = std::env::var("METRICS_BIND")
            .ok()
            .and_then(|s| s.parse().ok());

        Ok(ServerConfig {
            bind,
            store,
            jwt_secret,
            metrics_bind,
            sync: SyncConfig::from_env(),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!(
                    "Must be at least {MIN_JWT_SECRET_LEN} characters (128-bit security)"
                ),
            });
        }

        if let StoreBackend::Postgres(db) = &self.store
            && (db.max_connections == 0 || db.min_connections > db.max_connections)
        {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: format!(
                    "Must be non-zero and at least DB_MIN_CONNECTIONS ({})",
                    db.min_connections
                ),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server address ({})", self.bind),
            });
        }

        self.sync.validate()
    }
}
