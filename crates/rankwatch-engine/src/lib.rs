//! Polling engine and tracking commands.
//!
//! [`PollingEngine`] owns the single per-entity path (fetch, diff, persist,
//! dispatch) and runs it from two schedulers: the periodic sweep and the
//! manual guild refresh. [`TrackingService`] implements the user-facing
//! commands on top of the same collaborators.

pub mod config;
pub mod engine;
pub mod error;
pub mod tracking;

pub use config::EngineConfig;
pub use engine::{EntityOutcome, FatalRefresh, PollingEngine, SweepReport, SweepScope};
pub use error::{CommandError, CommandResult, EngineError, EngineResult};
pub use tracking::{GuildRemoval, TrackingService};
