//! Connection pool settings for the membership database.

use crate::config::parse_env_or;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    pub max_connections: u32,
    pub min_connections: u32,

    /// Pool acquire timeout in seconds
    pub connection_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Pool settings for `database_url` with every knob read from `DB_*`
    /// variables, falling back to defaults sized for a single lobby node.
    pub fn with_url(database_url: String) -> Self {
        Self {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", 20),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", 2),
            connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 5),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }

    /// `None` when `DATABASE_URL` is unset
    pub fn from_env() -> Option<Self> {
        std::env::var("DATABASE_URL").ok().map(Self::with_url)
    }
}
