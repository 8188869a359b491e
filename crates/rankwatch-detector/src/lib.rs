//! Ranking change detection.
//!
//! A pure function from (previous, current) ranking to a change record.
//! Tier dominates division, division dominates points, and identical
//! states always yield "unchanged".

pub mod change;
pub mod detector;

pub use change::{ChangeKind, ChangeLevel, ChangeRecord, Detection};
pub use detector::detect;
