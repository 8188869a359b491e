//! Change record types.

use rankwatch_core::RankState;
use serde::{Deserialize, Serialize};

/// Direction of a detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Promotion,
    Demotion,
    /// Same tier and division, different points.
    PointsChange,
}

impl ChangeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Promotion => "promotion",
            ChangeKind::Demotion => "demotion",
            ChangeKind::PointsChange => "points",
        }
    }
}

/// Most significant field that differed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeLevel {
    Tier,
    Division,
    Points,
}

/// A detected change. Ephemeral: consumed by the dispatcher in the same
/// sweep iteration and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub old: RankState,
    pub new: RankState,
    pub kind: ChangeKind,
    pub level: ChangeLevel,
    /// `new.points - old.points`, meaningful for any kind.
    pub points_delta: i32,
}

impl ChangeRecord {
    pub fn is_promotion(&self) -> bool {
        self.kind == ChangeKind::Promotion
    }

    pub fn is_demotion(&self) -> bool {
        self.kind == ChangeKind::Demotion
    }
}

/// Detector output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Tier, division and points all equal.
    Unchanged,
    /// No previous state: nothing to compare against.
    FirstObservation,
    Changed(ChangeRecord),
}

impl Detection {
    pub fn change(&self) -> Option<&ChangeRecord> {
        match self {
            Detection::Changed(record) => Some(record),
            _ => None,
        }
    }
}
