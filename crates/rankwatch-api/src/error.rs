//! API client error types.

use std::fmt;
use thiserror::Error;

/// Who rejected a request that surfaced as service unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableCause {
    /// 429 without the upstream rate-limit header (edge/proxy shard).
    Intermediary,
    /// 400 or 5xx from the upstream service.
    Upstream,
}

impl fmt::Display for UnavailableCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableCause::Intermediary => f.write_str("intermediary rejection"),
            UnavailableCause::Upstream => f.write_str("upstream error"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable (HTTP {status}, {cause})")]
    ServiceUnavailable { status: u16, cause: UnavailableCause },

    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("Authentication failed (HTTP {status}): check the API key")]
    Auth { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unexpected HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

impl ApiError {
    /// Credential errors cannot succeed for any entity.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::ServiceUnavailable { .. } => "unavailable",
            ApiError::RateLimitExceeded { .. } => "rate_limited",
            ApiError::Auth { .. } => "auth",
            ApiError::Transport(_) => "transport",
            ApiError::Decode(_) => "decode",
            ApiError::UnexpectedStatus { .. } => "unexpected_status",
            ApiError::HttpClient(_) => "http_client",
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
