//! Application configuration.

use crate::error::{AppError, AppResult};
use rankwatch_api::ApiConfig;
use rankwatch_engine::EngineConfig;
use rankwatch_notify::NotifyConfig;
use rankwatch_telemetry::DEFAULT_FILTER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the ranking API key.
pub const API_KEY_ENV: &str = "RIOT_API_KEY";
/// Environment variable holding the chat bot token.
pub const BOT_TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";
/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "RANKWATCH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Snapshot store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON snapshot holding tracked entities and guild settings.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/rankwatch.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Interval of the sweep statistics summary. 0 disables it.
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_log_filter() -> String {
    DEFAULT_FILTER.to_string()
}

fn default_stats_interval_secs() -> u64 {
    3600
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl TelemetryConfig {
    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

/// Top-level configuration, one section per component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Resolve the config path: explicit argument, then `RANKWATCH_CONFIG`,
    /// then the default path.
    pub fn resolve_path(explicit: Option<String>) -> String {
        explicit
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.api
            .validate()
            .map_err(|e| AppError::Config(format!("[api] {e}")))?;
        self.engine
            .validate()
            .map_err(|e| AppError::Config(format!("[engine] {e}")))?;
        self.notify
            .validate()
            .map_err(|e| AppError::Config(format!("[notify] {e}")))?;
        if self.store.path.as_os_str().is_empty() {
            return Err(AppError::Config("[store] path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Credentials read from the environment, never from the config file.
#[derive(Clone, Default)]
pub struct Secrets {
    pub api_key: Option<String>,
    pub bot_token: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: read(API_KEY_ENV),
            bot_token: read(BOT_TOKEN_ENV),
        }
    }

    pub fn require_api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Config(format!("{API_KEY_ENV} is not set")))
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
