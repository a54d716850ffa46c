//! Application settings and Telegram configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Telegram API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("session.db")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String) -> Self {
        Self {
            api_id,
            api_hash,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_API_ID` and `TG_API_HASH` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_id: i32 = std::env::var("TG_API_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;

        let api_hash = std::env::var("TG_API_HASH")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let session_path = std::env::var("TG_SESSION_PATH").map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            session_path,
        })
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Prefix every command starts with.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Name shown on the `alive` card.
    #[serde(default = "default_owner_name")]
    pub owner_name: String,

    /// Path to the ball catalog JSON file.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Upper bound for `spam` and `delayspam` counts.
    #[serde(default = "default_max_spam_count")]
    pub max_spam_count: u32,

    /// Minimum spacing between outgoing sends in milliseconds.
    #[serde(default = "default_min_send_interval")]
    pub min_send_interval_ms: u64,
}

fn default_command_prefix() -> String {
    ".".to_owned()
}

fn default_owner_name() -> String {
    "Trainer".to_owned()
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.json")
}

const fn default_max_spam_count() -> u32 {
    100
}

const fn default_min_send_interval() -> u64 {
    50
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            owner_name: default_owner_name(),
            catalog_path: default_catalog_path(),
            max_spam_count: default_max_spam_count(),
            min_send_interval_ms: default_min_send_interval(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    ///
    /// Unparsable numbers fall back to their defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            command_prefix: std::env::var("COMMAND_PREFIX")
                .ok()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(default_command_prefix),
            owner_name: std::env::var("OWNER_NAME").unwrap_or_else(|_| default_owner_name()),
            catalog_path: std::env::var("CATALOG_PATH")
                .map_or_else(|_| default_catalog_path(), PathBuf::from),
            max_spam_count: std::env::var("MAX_SPAM_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_spam_count),
            min_send_interval_ms: std::env::var("MIN_SEND_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_min_send_interval),
        }
    }

    /// Minimum spacing between outgoing sends.
    #[must_use]
    pub const fn min_send_interval(&self) -> Duration {
        Duration::from_millis(self.min_send_interval_ms)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.command_prefix, ".");
        assert_eq!(settings.max_spam_count, 100);
        assert_eq!(settings.catalog_path, PathBuf::from("catalog.json"));
        assert_eq!(settings.min_send_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings: BotSettings = serde_json::from_str(r#"{"owner_name": "Ash"}"#).unwrap();
        assert_eq!(settings.owner_name, "Ash");
        assert_eq!(settings.command_prefix, ".");
    }

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new(12345, "abc123".to_owned());
        assert_eq!(config.api_id, 12345);
        assert_eq!(config.api_hash, "abc123");
        assert_eq!(config.session_path, PathBuf::from("session.db"));
    }
}
