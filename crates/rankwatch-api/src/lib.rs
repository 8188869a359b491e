//! Resilient client for the upstream ranking API.
//!
//! Classifies every response into a typed outcome and applies the retry
//! policy per failure class:
//! - 2xx returns the payload, 404 an explicit "not found"
//! - upstream-authoritative 429 sleeps for `Retry-After` and retries
//! - intermediary 429, 400 and 5xx surface as service unavailable
//! - 401/403 are fatal
//! - transport failures retry with exponential backoff
//!
//! All attempts share one sliding-window request budget.

pub mod budget;
pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod retry;
pub mod transport;

pub use budget::RequestBudget;
pub use client::{ApiRequest, Endpoint, FetchOutcome, RiotClient, Route, Summoner};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, UnavailableCause};
pub use retry::{RetryPolicy, RetryState};
pub use transport::{
    BoxFuture, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, ScriptedReply,
    ScriptedTransport,
};
