//! Notification error types.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// Channel or message no longer exists.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing permission on the channel or message.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited by chat API (retry after {retry_after_ms}ms)")]
    RateLimited { retry_after_ms: u64 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl NotifyError {
    /// The target message or channel is gone or inaccessible.
    pub fn is_gone(&self) -> bool {
        matches!(self, NotifyError::NotFound(_) | NotifyError::Forbidden(_))
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;
