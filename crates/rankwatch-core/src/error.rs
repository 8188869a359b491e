//! Error types for rankwatch-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    #[error("Invalid division: {0}")]
    InvalidDivision(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid cluster: {0}")]
    InvalidCluster(String),

    #[error("Invalid Riot ID: {0}")]
    InvalidRiotId(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
