//! Notification configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delivery and interactive-lifetime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Minimum gap between two sends of one dispatch.
    #[serde(default = "default_send_pacing_ms")]
    pub send_pacing_ms: u64,

    /// How long a notification stays toggleable (default 72h).
    #[serde(default = "default_interactive_lifetime_secs")]
    pub interactive_lifetime_secs: u64,

    /// How often live notifications are scanned for expiry.
    #[serde(default = "default_expiry_scan_secs")]
    pub expiry_scan_secs: u64,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_send_pacing_ms() -> u64 {
    250
}

fn default_interactive_lifetime_secs() -> u64 {
    72 * 60 * 60
}

fn default_expiry_scan_secs() -> u64 {
    60
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            send_pacing_ms: default_send_pacing_ms(),
            interactive_lifetime_secs: default_interactive_lifetime_secs(),
            expiry_scan_secs: default_expiry_scan_secs(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NotifyConfig {
    pub fn send_pacing(&self) -> Duration {
        Duration::from_millis(self.send_pacing_ms)
    }

    pub fn interactive_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.interactive_lifetime_secs as i64)
    }

    pub fn expiry_scan_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_scan_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.interactive_lifetime_secs == 0 {
            return Err("interactive_lifetime_secs must be > 0".to_string());
        }
        if self.expiry_scan_secs == 0 {
            return Err("expiry_scan_secs must be > 0".to_string());
        }
        if !self.api_base.starts_with("http") {
            return Err(format!("api_base must be an http(s) URL: {}", self.api_base));
        }
        Ok(())
    }
}
