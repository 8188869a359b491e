//! Prometheus metrics and structured logging for rankwatch.
//!
//! - Prometheus counters for upstream calls, sweeps and notifications
//! - Structured logging with tracing (pretty or JSON)
//! - Periodic sweep statistics summary

pub mod error;
pub mod logging;
pub mod metrics;
pub mod sweep_stats;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, DEFAULT_FILTER};
pub use metrics::Metrics;
pub use sweep_stats::{SweepStats, SweepStatsReporter};
