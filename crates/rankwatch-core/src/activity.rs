//! Most recent activity (match) used to enrich rank notifications.

use crate::identity::{PlayerId, RiotId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lane / role, in roster display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Top,
    Jungle,
    Middle,
    Bottom,
    Utility,
    Unknown,
}

impl Role {
    /// Map an upstream team position ("TOP", "JUNGLE", ...). Anything
    /// unrecognised, including an empty string, is `Unknown`.
    pub fn from_position(position: &str) -> Self {
        match position {
            "TOP" => Role::Top,
            "JUNGLE" => Role::Jungle,
            "MIDDLE" | "MID" => Role::Middle,
            "BOTTOM" | "ADC" => Role::Bottom,
            "UTILITY" | "SUPPORT" => Role::Utility,
            _ => Role::Unknown,
        }
    }
}

/// Side of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    /// Upstream uses 100 for blue and 200 for red.
    pub fn from_id(team_id: u16) -> Self {
        if team_id == 100 {
            Team::Blue
        } else {
            Team::Red
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Blue => f.write_str("Blue Team"),
            Team::Red => f.write_str("Red Team"),
        }
    }
}

/// One player's line in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub player_id: PlayerId,
    /// Display name at match time; absent for anonymised entries.
    pub riot_id: Option<RiotId>,
    pub champion: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub win: bool,
    pub team: Team,
    pub role: Role,
}

impl Participant {
    /// "k/d/a".
    pub fn kda(&self) -> String {
        format!("{}/{}/{}", self.kills, self.deaths, self.assists)
    }

    /// Name shown in rosters.
    pub fn display_name(&self) -> String {
        self.riot_id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Summary of a player's most recent match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: String,
    pub participants: Vec<Participant>,
}

impl MatchSummary {
    /// The line belonging to `player`, if present.
    pub fn participant(&self, player: &PlayerId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.player_id == player)
    }

    /// Display name the player had in this match.
    pub fn riot_id_of(&self, player: &PlayerId) -> Option<&RiotId> {
        self.participant(player).and_then(|p| p.riot_id.as_ref())
    }

    /// Roster grouped by team (blue first), then ordered by role.
    ///
    /// The sort is stable, so players sharing a role keep upstream order.
    pub fn ordered_roster(&self) -> Vec<&Participant> {
        let mut roster: Vec<&Participant> = self.participants.iter().collect();
        roster.sort_by_key(|p| (p.team, p.role));
        roster
    }
}
