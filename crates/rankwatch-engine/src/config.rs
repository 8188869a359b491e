//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sweep scheduling and per-entity behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Time between sweep starts (default 10 minutes).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Delay after an entity that did real work, before the next one.
    #[serde(default = "default_entity_pacing_ms")]
    pub entity_pacing_ms: u64,

    /// Fetch the most recent match when a change is detected.
    #[serde(default = "default_enrichment")]
    pub enrichment: bool,

    /// Run the first sweep immediately instead of after one interval.
    #[serde(default = "default_sweep_on_start")]
    pub sweep_on_start: bool,
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_entity_pacing_ms() -> u64 {
    1500
}

fn default_enrichment() -> bool {
    true
}

fn default_sweep_on_start() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            entity_pacing_ms: default_entity_pacing_ms(),
            enrichment: default_enrichment(),
            sweep_on_start: default_sweep_on_start(),
        }
    }
}

impl EngineConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn entity_pacing(&self) -> Duration {
        Duration::from_millis(self.entity_pacing_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sweep_interval(), Duration::from_secs(600));
        assert_eq!(config.entity_pacing(), Duration::from_millis(1500));
        assert!(config.enrichment);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let config = EngineConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
