//! Configuration types for tweet-relay

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upstream account settings (login identity and watch target)
///
/// Groups the credentials used for session establishment plus the optional
/// handle to watch. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountConfig {
    /// Login username
    pub username: Option<String>,

    /// Login password
    pub password: Option<String>,

    /// One-time-password secret, forwarded to the login client untouched
    pub otp_secret: Option<String>,

    /// Email address for login verification challenges
    pub email_address: Option<String>,

    /// Handle to watch; defaults to the login username
    pub target_handle: Option<String>,
}

/// Discord delivery settings
///
/// Exactly one delivery mode must be configured: a webhook URL, or a bot
/// token together with a channel id. Used as a nested sub-config within
/// [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscordConfig {
    /// Incoming webhook URL
    pub webhook_url: Option<String>,

    /// Bot token (requires `channel_id`)
    pub token: Option<String>,

    /// Channel id to post into (requires `token`)
    pub channel_id: Option<String>,
}

/// Main configuration for the relay
///
/// Loaded from a JSON file with camelCase keys:
///
/// ```json
/// {
///   "account": { "username": "watcher", "password": "hunter2" },
///   "discord": { "webhookUrl": "https://discord.com/api/webhooks/..." }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Upstream account settings
    pub account: AccountConfig,

    /// Discord delivery settings
    pub discord: DiscordConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("could not read {}: {e}", path.display()),
            key: None,
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("could not parse {}: {e}", path.display()),
            key: None,
        })
    }

    /// Check the configuration, returning one message per violation
    ///
    /// An empty vec means the configuration is usable. Callers are expected to
    /// log every entry, not just the first.
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if !non_empty(&self.account.username) {
            violations.push("account.username must be a non-empty string".to_string());
        }
        if !non_empty(&self.account.password) {
            violations.push("account.password must be a non-empty string".to_string());
        }

        let webhook = non_empty(&self.discord.webhook_url);
        let bot = non_empty(&self.discord.token) && non_empty(&self.discord.channel_id);
        if !webhook && !bot {
            violations
                .push("discord must set either webhookUrl, or both token and channelId".to_string());
        }

        violations
    }

    /// The handle to watch
    ///
    /// Resolution order: the `TARGET_TWITTER_USERNAME` environment variable,
    /// then the configured `targetHandle`, then the login username.
    pub fn target_handle(&self) -> Option<String> {
        if let Ok(v) = std::env::var("TARGET_TWITTER_USERNAME")
            && !v.is_empty()
        {
            return Some(v);
        }
        self.account
            .target_handle
            .clone()
            .filter(|v| !v.is_empty())
            .or_else(|| self.account.username.clone().filter(|v| !v.is_empty()))
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Configuration file location: `CONFIG_PATH` env var, else `./data/config.json`
pub fn config_path() -> PathBuf {
    env_path("CONFIG_PATH", "./data/config.json")
}

/// Filesystem locations for the relay's state files
///
/// Both paths come from the environment with defaults under `./data/`:
/// `COOKIE_CACHE_PATH` for the session cookie cache and `NOTIFIED_PATH` for
/// the notified-id ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoragePaths {
    /// Cached session cookies
    pub cookie_cache: PathBuf,

    /// Ledger of already-notified post ids
    pub notified: PathBuf,
}

impl StoragePaths {
    /// Resolve paths from the environment, falling back to `./data/` defaults
    pub fn from_env() -> Self {
        Self {
            cookie_cache: env_path("COOKIE_CACHE_PATH", "./data/twitter-cookies.json"),
            notified: env_path("NOTIFIED_PATH", "./data/notified.json"),
        }
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    match std::env::var(var) {
        Ok(v) if !v.is_empty() => PathBuf::from(v),
        _ => PathBuf::from(default),
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds (default: 1000)
    #[serde(default = "default_base_delay", with = "duration_millis")]
    pub base_delay: Duration,

    /// Ceiling on the backoff delay, in milliseconds (default: 30000)
    #[serde(default = "default_max_delay", with = "duration_millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
        }
    }
}

impl RetryConfig {
    /// Policy for login attempts: a longer budget, same delays
    pub fn login() -> Self {
        Self {
            max_attempts: 5,
            ..Self::default()
        }
    }

    /// Policy for data fetches against the upstream API
    pub fn fetch() -> Self {
        Self {
            base_delay: Duration::from_millis(2000),
            ..Self::default()
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_max_delay() -> Duration {
    Duration::from_millis(30_000)
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
