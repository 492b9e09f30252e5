//! Process configuration, loaded once from the environment at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Redaction label for the Telegram bot token.
pub const TELEGRAM_TOKEN_LABEL: &str = "*****TELEGRAM_TOKEN*****";

/// Redaction label for the Discord bot token.
pub const DISCORD_TOKEN_LABEL: &str = "*****DISCORD_TOKEN*****";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Immutable relay configuration. Built once in the binary and shared by
/// reference with every component.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Discord bot token for the gateway connection.
    pub discord_token: String,
    /// The watched order-confirmation channel.
    pub discord_channel_id: u64,
    /// Telegram bot token for notifications and control replies.
    pub telegram_token: String,
    /// Destination chat, also the only authorized control-command sender.
    pub telegram_chat_id: i64,
    pub orders_file: PathBuf,
    pub error_log_file: PathBuf,
    /// Upper bound on messages walked during startup backfill.
    pub history_limit: usize,
    /// Long-poll hold passed to getUpdates.
    pub poll_timeout_secs: u64,
    /// Sleep between control-loop cycles, and after a failed cycle.
    pub poll_backoff: Duration,
    /// Process start, for `/uptime`.
    pub started_at: DateTime<Utc>,
    /// Host start, for `/vpsuptime`. Defaults to process start when unset.
    pub vps_started_at: DateTime<Utc>,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let discord_token =
            env_var_non_empty("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let telegram_token =
            env_var_non_empty("TELEGRAM_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;

        let discord_channel_id = env_var_non_empty("DISCORD_CHANNEL_ID")
            .ok_or(ConfigError::Missing("DISCORD_CHANNEL_ID"))
            .and_then(|value| {
                value
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("DISCORD_CHANNEL_ID", value))
            })?;
        let telegram_chat_id = env_var_non_empty("TELEGRAM_CHAT_ID")
            .ok_or(ConfigError::Missing("TELEGRAM_CHAT_ID"))
            .and_then(|value| {
                value
                    .parse::<i64>()
                    .map_err(|_| ConfigError::Invalid("TELEGRAM_CHAT_ID", value))
            })?;

        let orders_file = env_var_non_empty("ORDERS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("orders.txt"));
        let error_log_file = env_var_non_empty("ERROR_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("error.log"));

        let history_limit = env_var_non_empty("HISTORY_LIMIT")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(10_000);
        let poll_timeout_secs = env_var_non_empty("CONTROL_POLL_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(30);
        let poll_backoff = env_var_non_empty("CONTROL_POLL_BACKOFF_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(2));

        let started_at = Utc::now();
        let vps_started_at = env_var_non_empty("VPS_START_TIME")
            .map(|value| {
                DateTime::parse_from_rfc3339(&value)
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .map_err(|err| ConfigError::Invalid("VPS_START_TIME", err.to_string()))
            })
            .transpose()?
            .unwrap_or(started_at);

        Ok(Self {
            discord_token,
            discord_channel_id,
            telegram_token,
            telegram_chat_id,
            orders_file,
            error_log_file,
            history_limit,
            poll_timeout_secs,
            poll_backoff,
            started_at,
            vps_started_at,
        })
    }

    /// `(secret value, replacement label)` pairs for the error log.
    pub fn secret_redactions(&self) -> Vec<(String, String)> {
        vec![
            (
                self.telegram_token.clone(),
                TELEGRAM_TOKEN_LABEL.to_string(),
            ),
            (self.discord_token.clone(), DISCORD_TOKEN_LABEL.to_string()),
        ]
    }
}

fn env_var_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    struct EnvGuard {
        key: String,
        previous: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let previous = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                previous,
            }
        }

        fn unset(key: &str) -> Self {
            let previous = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                previous,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.previous {
                Some(value) => env::set_var(&self.key, value),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn required_guards() -> Vec<EnvGuard> {
        vec![
            EnvGuard::set("DISCORD_TOKEN", "discord-secret"),
            EnvGuard::set("TELEGRAM_TOKEN", "telegram-secret"),
            EnvGuard::set("DISCORD_CHANNEL_ID", "123456789"),
            EnvGuard::set("TELEGRAM_CHAT_ID", "-100987654321"),
            EnvGuard::unset("ORDERS_FILE"),
            EnvGuard::unset("ERROR_LOG_FILE"),
            EnvGuard::unset("HISTORY_LIMIT"),
            EnvGuard::unset("VPS_START_TIME"),
        ]
    }

    #[test]
    #[serial]
    fn loads_with_defaults() {
        let _guards = required_guards();

        let config = RelayConfig::from_env().expect("config");
        assert_eq!(config.discord_channel_id, 123456789);
        assert_eq!(config.telegram_chat_id, -100987654321);
        assert_eq!(config.orders_file, PathBuf::from("orders.txt"));
        assert_eq!(config.error_log_file, PathBuf::from("error.log"));
        assert_eq!(config.history_limit, 10_000);
        assert_eq!(config.poll_backoff, Duration::from_secs(2));
        assert_eq!(config.vps_started_at, config.started_at);
    }

    #[test]
    #[serial]
    fn missing_token_is_fatal() {
        let mut guards = required_guards();
        guards.push(EnvGuard::unset("DISCORD_TOKEN"));

        let result = RelayConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Missing("DISCORD_TOKEN"))));
    }

    #[test]
    #[serial]
    fn invalid_channel_id_is_rejected() {
        let mut guards = required_guards();
        guards.push(EnvGuard::set("DISCORD_CHANNEL_ID", "not-a-number"));

        let result = RelayConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid("DISCORD_CHANNEL_ID", _))
        ));
    }

    #[test]
    #[serial]
    fn vps_start_time_parses_rfc3339() {
        let mut guards = required_guards();
        guards.push(EnvGuard::set("VPS_START_TIME", "2025-08-28T20:00:00+07:00"));

        let config = RelayConfig::from_env().expect("config");
        assert!(config.vps_started_at < config.started_at);
    }

    #[test]
    #[serial]
    fn secret_redactions_cover_both_tokens() {
        let _guards = required_guards();

        let config = RelayConfig::from_env().expect("config");
        let redactions = config.secret_redactions();
        assert!(redactions
            .iter()
            .any(|(value, label)| value == "telegram-secret" && label == TELEGRAM_TOKEN_LABEL));
        assert!(redactions
            .iter()
            .any(|(value, label)| value == "discord-secret" && label == DISCORD_TOKEN_LABEL));
    }
}
