//! Runtime configuration for board sessions.
//!
//! Every knob has a default, so a session can run without any environment.
//! [`BoardConfig::from_env`] overlays values from `TASKBOARD_*` variables.

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the per-call timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "TASKBOARD_PERSISTENCE_TIMEOUT_MS";
/// Environment variable selecting the [`RefreshStrategy`].
pub const REFRESH_ENV: &str = "TASKBOARD_REFRESH_STRATEGY";
/// Environment variable selecting the [`OrderPersistence`] mode.
pub const ORDER_ENV: &str = "TASKBOARD_ORDER_PERSISTENCE";
/// Environment variable toggling version checks on lane changes.
pub const VERSION_CHECK_ENV: &str = "TASKBOARD_CHECK_VERSIONS";

/// How the board catches up after a lane change was accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshStrategy {
    /// Re-fetch every task and replace the board.
    #[default]
    Refetch,
    /// Keep the local splice and merge only the confirmed task.
    Splice,
}

/// Whether positions inside a lane survive a re-fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderPersistence {
    /// Only the lane is stored; intra-lane order follows fetch order.
    #[default]
    Ephemeral,
    /// A rank is stored with every drop, so reorders are durable.
    Ranked,
}

/// Settings for a board session.
///
/// # Examples
///
/// ```
/// use taskboard::config::{BoardConfig, OrderPersistence};
///
/// let config = BoardConfig::default();
/// assert_eq!(config.order_persistence, OrderPersistence::Ephemeral);
///
/// let durable = BoardConfig::durable_order();
/// assert_eq!(durable.order_persistence, OrderPersistence::Ranked);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// Deadline for each gateway call.
    pub persistence_timeout: Duration,
    /// Post-success refresh behaviour.
    pub refresh: RefreshStrategy,
    /// Intra-lane order durability.
    pub order_persistence: OrderPersistence,
    /// Send the observed version with every lane change.
    pub check_versions: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            persistence_timeout: Duration::from_secs(10),
            refresh: RefreshStrategy::Refetch,
            order_persistence: OrderPersistence::Ephemeral,
            check_versions: true,
        }
    }
}

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable held a value that could not be parsed.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },
}

impl BoardConfig {
    /// Persists intra-lane order alongside the lane.
    #[must_use]
    pub fn durable_order() -> Self {
        Self {
            order_persistence: OrderPersistence::Ranked,
            ..Self::default()
        }
    }

    /// Keeps local splices instead of re-fetching after every drop.
    #[must_use]
    pub fn spliced() -> Self {
        Self {
            refresh: RefreshStrategy::Splice,
            ..Self::default()
        }
    }

    /// Returns a copy with a different per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.persistence_timeout = timeout;
        self
    }

    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, starting from the defaults.
    ///
    /// Unset and blank variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(|value| (key, value))
        };

        if let Some((key, value)) = read(TIMEOUT_ENV) {
            let millis = value
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .ok_or(ConfigError::InvalidValue { key, value })?;
            config.persistence_timeout = Duration::from_millis(millis);
        }

        if let Some((key, value)) = read(REFRESH_ENV) {
            config.refresh = match value.to_ascii_lowercase().as_str() {
                "refetch" => RefreshStrategy::Refetch,
                "splice" => RefreshStrategy::Splice,
                _ => return Err(ConfigError::InvalidValue { key, value }),
            };
        }

        if let Some((key, value)) = read(ORDER_ENV) {
            config.order_persistence = match value.to_ascii_lowercase().as_str() {
                "ephemeral" => OrderPersistence::Ephemeral,
                "ranked" => OrderPersistence::Ranked,
                _ => return Err(ConfigError::InvalidValue { key, value }),
            };
        }

        if let Some((key, value)) = read(VERSION_CHECK_ENV) {
            config.check_versions = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidValue { key, value }),
            };
        }

        Ok(config)
    }
}
