//! Application error types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(#[from] rankwatch_api::ApiError),

    #[error("Store error: {0}")]
    Store(#[from] rankwatch_store::StoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] rankwatch_notify::NotifyError),

    #[error("Engine error: {0}")]
    Engine(#[from] rankwatch_engine::EngineError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] rankwatch_telemetry::TelemetryError),

    #[error("Another rankwatch process is sweeping {}", .0.display())]
    SweepsClaimed(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
