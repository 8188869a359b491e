//! Store error types.

use rankwatch_core::{PlayerId, Region};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Update of a record that does not exist (and no subscriber to create it).
    #[error("Entity not found: {0}")]
    NotFound(PlayerId),

    #[error("Entity {id} is tracked in region {stored}, not {requested}")]
    RegionConflict {
        id: PlayerId,
        stored: Region,
        requested: Region,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
