//! Composer, pool and connection settings.
//!
//! All settings are plain structs with builder-style setters and `Deserialize`
//! impls, so they can be embedded in an application's own config file.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;

/// What `join` does when handed an empty list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyJoinPolicy {
    /// Return the empty fragment.
    #[default]
    Empty,
    /// Fail with [`SqlError::EmptyJoin`](crate::SqlError::EmptyJoin).
    Error,
}

/// Settings for composing and rendering queries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Empty-list behaviour of [`join_with`](crate::join_with).
    pub empty_join: EmptyJoinPolicy,
    /// Collapse indentation after newlines in rendered SQL.
    pub normalize_whitespace: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            empty_join: EmptyJoinPolicy::Empty,
            normalize_whitespace: true,
        }
    }
}

impl ComposeConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the empty-list policy for joins.
    pub fn empty_join(mut self, policy: EmptyJoinPolicy) -> Self {
        self.empty_join = policy;
        self
    }

    /// Enable or disable indentation collapsing.
    pub fn normalize_whitespace(mut self, enabled: bool) -> Self {
        self.normalize_whitespace = enabled;
        self
    }
}

/// Settings for [`PoolRegistry`](crate::pool::PoolRegistry).
///
/// Durations are read as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub pool_min: u32,
    pub pool_max: u32,
    /// Upper bound for acquiring (and pinging) a connection before the pool
    /// is considered broken and recreated.
    #[serde(rename = "acquire_timeout_ms", deserialize_with = "duration_ms")]
    pub acquire_timeout: Duration,
    /// Minimum time between health pings on acquired connections.
    #[serde(rename = "ping_interval_ms", deserialize_with = "duration_ms")]
    pub ping_interval: Duration,
    /// Drain time granted to a pool being closed.
    #[serde(rename = "close_timeout_ms", deserialize_with = "duration_ms")]
    pub close_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_min: 3,
            pool_max: 12,
            acquire_timeout: Duration::from_secs(3),
            ping_interval: Duration::from_secs(60),
            close_timeout: Duration::from_secs(1),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool_min(mut self, min: u32) -> Self {
        self.pool_min = min;
        self
    }

    pub fn pool_max(mut self, max: u32) -> Self {
        self.pool_max = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }
}

fn duration_ms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Credentials and address of one database.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "connection_string")]
    pub connect_string: String,
}

impl ConnectConfig {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        connect_string: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            connect_string: connect_string.into(),
        }
    }
}

impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("connect_string", &self.connect_string)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_config_fills_missing_fields() {
        let config: ComposeConfig = serde_json::from_str(r#"{"empty_join":"error"}"#).unwrap();
        assert_eq!(config.empty_join, EmptyJoinPolicy::Error);
        assert!(config.normalize_whitespace);
    }

    #[test]
    fn pool_config_reads_milliseconds() {
        let config: PoolConfig =
            serde_json::from_str(r#"{"pool_max":4,"acquire_timeout_ms":250}"#).unwrap();
        assert_eq!(config.pool_max, 4);
        assert_eq!(config.pool_min, 3);
        assert_eq!(config.acquire_timeout, Duration::from_millis(250));
        assert_eq!(config.ping_interval, Duration::from_secs(60));
    }

    #[test]
    fn connect_config_accepts_either_spelling() {
        let config: ConnectConfig =
            serde_json::from_str(r#"{"user":"app","connection_string":"db:1521/x"}"#).unwrap();
        assert_eq!(config.connect_string, "db:1521/x");
    }

    #[test]
    fn debug_redacts_password() {
        let config = ConnectConfig::new("app", "hunter2", "db");
        let out = format!("{config:?}");
        assert!(!out.contains("hunter2"));
        assert!(out.contains("<redacted>"));
    }
}
