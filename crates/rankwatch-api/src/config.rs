//! API client configuration.

use crate::retry::RetryPolicy;
use rankwatch_core::{Cluster, Region, RegionClusterTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Placeholder replaced by the platform or cluster host prefix.
pub const HOST_PLACEHOLDER: &str = "{host}";

/// Configuration for the upstream ranking API.
///
/// The API key is not part of this struct; it is read from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL template; `{host}` becomes e.g. `na1` or `americas`.
    #[serde(default = "default_host_template")]
    pub host_template: String,
    /// Maximum attempts per logical call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Sleep used when a rate-limited response carries no `Retry-After`.
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
    /// First transport-failure backoff delay.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Transport-failure backoff cap.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Upper bound of random jitter added to transport backoff.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Requests allowed per sliding window.
    #[serde(default = "default_budget_requests")]
    pub budget_requests: u32,
    /// Sliding window length.
    #[serde(default = "default_budget_window_secs")]
    pub budget_window_secs: u64,
    /// Fixed cluster serving account (Riot ID) lookups.
    #[serde(default = "default_account_cluster")]
    pub account_cluster: Cluster,
    /// Region → cluster routes replacing the built-in table entries.
    #[serde(default)]
    pub cluster_overrides: HashMap<Region, Cluster>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_host_template() -> String {
    "https://{host}.api.riotgames.com".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_after_secs() -> u64 {
    1
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    8_000
}

fn default_jitter_ms() -> u64 {
    250
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_budget_requests() -> u32 {
    100
}

fn default_budget_window_secs() -> u64 {
    120
}

fn default_account_cluster() -> Cluster {
    Cluster::Americas
}

fn default_user_agent() -> String {
    concat!("rankwatch/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host_template: default_host_template(),
            max_attempts: default_max_attempts(),
            default_retry_after_secs: default_retry_after_secs(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            jitter_ms: default_jitter_ms(),
            timeout_secs: default_timeout_secs(),
            budget_requests: default_budget_requests(),
            budget_window_secs: default_budget_window_secs(),
            account_cluster: default_account_cluster(),
            cluster_overrides: HashMap::new(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Retry policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            default_retry_after: Duration::from_secs(self.default_retry_after_secs),
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
            jitter_max: Duration::from_millis(self.jitter_ms),
        }
    }

    /// Routing table for activity lookups.
    pub fn cluster_table(&self) -> RegionClusterTable {
        RegionClusterTable::with_overrides(&self.cluster_overrides)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn budget_window(&self) -> Duration {
        Duration::from_secs(self.budget_window_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.budget_requests == 0 || self.budget_window_secs == 0 {
            return Err("request budget must allow at least one request per window".to_string());
        }
        if !self.host_template.contains(HOST_PLACEHOLDER) {
            return Err(format!(
                "host_template ({}) must contain {HOST_PLACEHOLDER}",
                self.host_template
            ));
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(format!(
                "backoff_base_ms ({}) must not exceed backoff_max_ms ({})",
                self.backoff_base_ms, self.backoff_max_ms
            ));
        }
        Ok(())
    }
}
