//! Configuration management for the ban sync bot
//!
//! Configuration comes from a TOML file or from `BANSYNC_*` environment
//! variables layered over defaults. Credentials are not part of it; they
//! belong to whatever transport drives the bot.

use crate::logging::{LogConfig, LogLevel};
use crate::retry::RetryPolicy;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main bot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Homeserver base URL
    pub homeserver: String,

    /// The bot's own user id; events it sends are never mirrored
    pub user_id: UserId,

    /// The only user allowed to issue commands and invite the bot
    pub owner: UserId,

    pub device_id: String,

    /// Location of the link registry JSON file
    pub store_path: PathBuf,

    /// Retry policy for joining rooms the owner invites the bot to
    pub join_retry: RetryPolicy,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    pub json_format: bool,

    pub with_target: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            homeserver: "http://localhost:8008".to_string(),
            user_id: UserId::from("@banbot:localhost"),
            owner: UserId::from("@admin:localhost"),
            device_id: "banbot".to_string(),
            store_path: PathBuf::from("store.json"),
            join_retry: RetryPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", key, e)))
}

impl BotConfig {
    /// Load configuration from environment variables
    ///
    /// Variables follow the pattern `BANSYNC_<KEY>`, e.g.
    /// `BANSYNC_OWNER=@admin:example.org`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`BotConfig::from_env`], reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(homeserver) = lookup("BANSYNC_HOMESERVER") {
            config.homeserver = homeserver;
        }
        if let Some(user_id) = lookup("BANSYNC_USER_ID") {
            config.user_id = UserId::new(user_id);
        }
        if let Some(owner) = lookup("BANSYNC_OWNER") {
            config.owner = UserId::new(owner);
        }
        if let Some(device_id) = lookup("BANSYNC_DEVICE_ID") {
            config.device_id = device_id;
        }
        if let Some(store_path) = lookup("BANSYNC_STORE_PATH") {
            config.store_path = PathBuf::from(store_path);
        }

        // Join retry
        if let Some(attempts) = lookup("BANSYNC_JOIN_MAX_ATTEMPTS") {
            config.join_retry.max_attempts = parse_var("BANSYNC_JOIN_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(delay) = lookup("BANSYNC_JOIN_RETRY_DELAY") {
            config.join_retry.delay = humantime_serde::re::humantime::parse_duration(&delay)
                .map_err(|e| {
                    ConfigError::InvalidValue(format!("BANSYNC_JOIN_RETRY_DELAY: {}", e))
                })?;
        }

        // Logging
        if let Some(level) = lookup("BANSYNC_LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }
        if let Some(json) = lookup("BANSYNC_LOG_JSON") {
            config.logging.json_format = parse_var("BANSYNC_LOG_JSON", &json)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.user_id.is_well_formed() {
            return Err(ConfigError::ValidationFailed(format!(
                "user_id '{}' is not of the form @name:server",
                self.user_id
            )));
        }
        if !self.owner.is_well_formed() {
            return Err(ConfigError::ValidationFailed(format!(
                "owner '{}' is not of the form @name:server",
                self.owner
            )));
        }
        if self.owner == self.user_id {
            return Err(ConfigError::ValidationFailed(
                "owner must differ from the bot's own user_id".to_string(),
            ));
        }
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "store_path must not be empty".to_string(),
            ));
        }

        if self.join_retry.max_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "join_retry.max_attempts must be greater than 0".to_string(),
            ));
        }
        if !(self.join_retry.backoff >= 1.0) {
            return Err(ConfigError::ValidationFailed(
                "join_retry.backoff must be at least 1.0".to_string(),
            ));
        }

        LogLevel::from_str(&self.logging.level)
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        Ok(())
    }

    /// Logging settings in the form the logging subsystem takes
    pub fn log_config(&self) -> LogConfig {
        let level = LogLevel::from_str(&self.logging.level).unwrap_or_default();
        LogConfig::new(level)
            .json_format(self.logging.json_format)
            .with_target(self.logging.with_target)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }

    /// Delay before the first join retry
    pub fn join_retry_delay(&self) -> Duration {
        self.join_retry.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store_path, PathBuf::from("store.json"));
        assert_eq!(config.join_retry.max_attempts, 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = BotConfig::default();
        config.owner = UserId::from("admin");
        assert!(config.validate().is_err());

        config = BotConfig::default();
        config.owner = config.user_id.clone();
        assert!(config.validate().is_err());

        config = BotConfig::default();
        config.join_retry.max_attempts = 0;
        assert!(config.validate().is_err());

        config = BotConfig::default();
        config.join_retry.backoff = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = BotConfig::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_config().level, LogLevel::Debug);
    }

    #[test]
    fn test_from_lookup_overrides_defaults() {
        let config = BotConfig::from_lookup(lookup(&[
            ("BANSYNC_USER_ID", "@bot:example.org"),
            ("BANSYNC_OWNER", "@alice:example.org"),
            ("BANSYNC_STORE_PATH", "/var/lib/bansync/links.json"),
            ("BANSYNC_JOIN_MAX_ATTEMPTS", "5"),
            ("BANSYNC_JOIN_RETRY_DELAY", "500ms"),
            ("BANSYNC_LOG_LEVEL", "DEBUG"),
            ("BANSYNC_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.user_id, UserId::from("@bot:example.org"));
        assert_eq!(config.owner, UserId::from("@alice:example.org"));
        assert_eq!(config.store_path, PathBuf::from("/var/lib/bansync/links.json"));
        assert_eq!(config.join_retry.max_attempts, 5);
        assert_eq!(config.join_retry_delay(), Duration::from_millis(500));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = BotConfig::from_lookup(lookup(&[("BANSYNC_JOIN_MAX_ATTEMPTS", "many")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue(_))));

        let err = BotConfig::from_lookup(lookup(&[("BANSYNC_JOIN_RETRY_DELAY", "soon")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bansync.toml");

        let mut config = BotConfig::default();
        config.owner = UserId::from("@alice:example.org");
        config.join_retry.delay = Duration::from_secs(5);
        config.save_to_file(&path).unwrap();

        assert_eq!(BotConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bansync.toml");
        std::fs::write(
            &path,
            "owner = \"@alice:example.org\"\n\n[join_retry]\nmax_attempts = 4\ndelay = \"1s\"\nbackoff = 2.0\n",
        )
        .unwrap();

        let config = BotConfig::from_file(&path).unwrap();
        assert_eq!(config.owner, UserId::from("@alice:example.org"));
        assert_eq!(config.join_retry.max_attempts, 4);
        assert_eq!(config.device_id, "banbot");
    }
}
