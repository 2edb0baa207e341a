//! Tunables for the synchronizers.

use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Synchronizer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Chips each player starts a table with
    pub starting_chips: i64,

    /// Interval between keepalive pings
    pub ping_interval: Duration,

    /// Silence after which a socket counts as dead
    pub read_timeout: Duration,

    /// Deadline for any single write
    pub write_timeout: Duration,

    /// Countdown starting value in seconds
    pub countdown_total: f64,

    /// Wall-clock time between countdown frames
    pub countdown_tick: Duration,

    /// Seconds subtracted per countdown frame
    pub countdown_step: f64,

    /// Largest inbound frame accepted, in bytes
    pub max_frame_bytes: usize,

    /// Seed for dealer selection; `None` draws from OS entropy
    pub dealer_seed: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            starting_chips: 1000,
            ping_interval: Duration::from_secs(30),
            read_timeout: Duration::from_secs(180),
            write_timeout: Duration::from_secs(5),
            countdown_total: 15.0,
            countdown_tick: Duration::from_millis(100),
            countdown_step: 0.1,
            max_frame_bytes: 50 << 20,
            dealer_seed: None,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            starting_chips: parse_env_or("STARTING_CHIPS", defaults.starting_chips),
            ping_interval: Duration::from_secs(parse_env_or(
                "PING_INTERVAL_SECS",
                defaults.ping_interval.as_secs(),
            )),
            read_timeout: Duration::from_secs(parse_env_or(
                "READ_TIMEOUT_SECS",
                defaults.read_timeout.as_secs(),
            )),
            write_timeout: Duration::from_secs(parse_env_or(
                "WRITE_TIMEOUT_SECS",
                defaults.write_timeout.as_secs(),
            )),
            countdown_total: parse_env_or("COUNTDOWN_SECS", defaults.countdown_total),
            countdown_tick: Duration::from_millis(parse_env_or(
                "COUNTDOWN_TICK_MS",
                defaults.countdown_tick.as_millis() as u64,
            )),
            countdown_step: defaults.countdown_step,
            max_frame_bytes: parse_env_or("MAX_FRAME_BYTES", defaults.max_frame_bytes),
            dealer_seed: std::env::var("DEALER_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_chips <= 0 {
            return Err(ConfigError::Invalid {
                var: "STARTING_CHIPS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.ping_interval.is_zero() || self.ping_interval >= self.read_timeout {
            return Err(ConfigError::Invalid {
                var: "PING_INTERVAL_SECS".to_string(),
                reason: format!(
                    "Must be non-zero and shorter than the read timeout ({}s)",
                    self.read_timeout.as_secs()
                ),
            });
        }

        if self.write_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "WRITE_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.countdown_tick.is_zero() {
            return Err(ConfigError::Invalid {
                var: "COUNTDOWN_TICK_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if !self.countdown_total.is_finite() || self.countdown_total < 0.0 {
            return Err(ConfigError::Invalid {
                var: "COUNTDOWN_SECS".to_string(),
                reason: "Must be a non-negative number".to_string(),
            });
        }

        if self.countdown_step.is_nan() || self.countdown_step <= 0.0 {
            return Err(ConfigError::Invalid {
                var: "countdown_step".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.max_frame_bytes == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_FRAME_BYTES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Helper to parse environment variable with default fallback
pub fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.starting_chips, 1000);
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_ping_must_be_shorter_than_read_timeout() {
        let config = SyncConfig {
            ping_interval: Duration::from_secs(200),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PING_INTERVAL_SECS"));
    }

    #[test]
    fn test_zero_chips_rejected() {
        let config = SyncConfig {
            starting_chips: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_negative_countdown_rejected() {
        let config = SyncConfig {
            countdown_total: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_or_falls_back() {
        assert_eq!(parse_env_or("CARD_LOBBY_SURELY_UNSET_VAR", 7u32), 7);
    }
}
