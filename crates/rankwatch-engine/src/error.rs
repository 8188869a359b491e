//! Engine and command error types.

use rankwatch_api::ApiError;
use rankwatch_core::{Region, RiotId};
use rankwatch_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("A sweep is already running")]
    SweepInProgress,
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Failure of a user-issued command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid Riot ID: {0}")]
    InvalidRiotId(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Player {0} not found")]
    PlayerNotFound(RiotId),

    #[error("Player {riot_id} has no profile on {region}")]
    NotOnRegion { riot_id: RiotId, region: Region },

    #[error("Player {0} is already tracked in this guild")]
    AlreadyTracked(RiotId),

    #[error("Player {riot_id} is tracked on {stored}")]
    RegionConflict { riot_id: RiotId, stored: Region },

    #[error("Player {0} is not tracked")]
    NotTracked(RiotId),

    #[error("Player {0} is not tracked in this guild")]
    NotTrackedInGuild(RiotId),

    #[error("No players tracked in this guild")]
    NothingTracked,

    #[error("A sweep is already running")]
    Busy,

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CommandError {
    /// Short human-readable message for the user who issued the command.
    pub fn user_message(&self) -> String {
        match self {
            CommandError::InvalidRiotId(_) => {
                "Invalid input, please ensure syntax is: username#tagline.".to_string()
            }
            CommandError::InvalidRegion(input) => format!(
                "The region '{input}' is invalid. List of valid regions: {}",
                Region::valid_list()
            ),
            CommandError::PlayerNotFound(riot_id) => format!("User Not Found: {riot_id}"),
            CommandError::NotOnRegion { riot_id, region } => format!(
                "Player {riot_id} was found, but they do not have a profile on {region}. \
                 Please enter the user's correct region."
            ),
            CommandError::AlreadyTracked(riot_id) => {
                format!("{riot_id} is already being tracked in this server.")
            }
            CommandError::RegionConflict { riot_id, stored } => format!(
                "{riot_id} is already tracked on {stored}. A player can only be tracked on one region."
            ),
            CommandError::NotTracked(riot_id) => format!("{riot_id} is not in the database."),
            CommandError::NotTrackedInGuild(riot_id) => {
                format!("{riot_id} is not being tracked in this server.")
            }
            CommandError::NothingTracked => "No users tracked in this server. Use track.".to_string(),
            CommandError::Busy => "Bot is busy, try again in a minute.".to_string(),
            CommandError::Api(ApiError::RateLimitExceeded { .. }) => {
                "Bot is busy, try again in a minute: Riot API rate limit reached.".to_string()
            }
            CommandError::Api(ApiError::Auth { .. }) => {
                "Riot API issue: the bot's API key was rejected.".to_string()
            }
            CommandError::Api(ApiError::NotFound(what)) => format!("User Not Found: {what}"),
            CommandError::Api(e) => format!("Riot API issue: {e}"),
            CommandError::Store(_) => "Database update failed".to_string(),
        }
    }
}

impl From<EngineError> for CommandError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Api(e) => CommandError::Api(e),
            EngineError::Store(e) => CommandError::Store(e),
            EngineError::SweepInProgress => CommandError::Busy,
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
