//! rankwatch: ranked-ladder tracker.
//!
//! Wires the components together:
//! - ranking API client with retry and request budget
//! - JSON snapshot store
//! - polling engine and tracking commands
//! - chat notifications with interactive expiry

pub mod app;
pub mod commands;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, Secrets};
pub use error::{AppError, AppResult};
