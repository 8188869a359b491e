//! Upstream payload shapes and their conversion into core types.
//!
//! Validation is minimal: required fields must exist, everything else is
//! defaulted.

use crate::error::{ApiError, ApiResult};
use rankwatch_core::{
    Division, MatchSummary, Participant, PlayerId, RankState, RiotId, Role, Team, Tier,
};
use serde::Deserialize;

/// Queue whose standing is tracked.
pub const RANKED_SOLO_QUEUE: &str = "RANKED_SOLO_5x5";

/// Queue id used for the recent-activity lookup.
pub const RANKED_SOLO_QUEUE_ID: u32 = 420;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub tag_line: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    pub puuid: String,
    #[serde(default)]
    pub summoner_level: u64,
    #[serde(default)]
    pub profile_icon_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    pub queue_type: String,
    pub tier: String,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub league_points: i32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

impl LeagueEntryDto {
    /// Apex tiers are reported with division "I"; they have no divisions.
    pub fn to_rank_state(&self) -> ApiResult<RankState> {
        let tier: Tier = self
            .tier
            .parse()
            .map_err(|e| ApiError::Decode(format!("league entry: {e}")))?;
        let division = if tier.is_apex() {
            Division::None
        } else {
            self.rank
                .parse()
                .map_err(|e| ApiError::Decode(format!("league entry: {e}")))?
        };
        Ok(RankState::new(tier, division, self.league_points))
    }
}

/// Ranking from the solo-queue entry; no entry means unranked.
pub fn rank_from_entries(entries: &[LeagueEntryDto]) -> ApiResult<RankState> {
    entries
        .iter()
        .find(|e| e.queue_type == RANKED_SOLO_QUEUE)
        .map(LeagueEntryDto::to_rank_state)
        .unwrap_or_else(|| Ok(RankState::unranked()))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub metadata: MatchMetadataDto,
    pub info: MatchInfoDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadataDto {
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchInfoDto {
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    #[serde(default)]
    pub riot_id_game_name: Option<String>,
    #[serde(default)]
    pub riot_id_tagline: Option<String>,
    #[serde(default)]
    pub champion_name: String,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub win: bool,
    pub team_id: u16,
    #[serde(default)]
    pub team_position: String,
}

impl From<ParticipantDto> for Participant {
    fn from(dto: ParticipantDto) -> Self {
        let riot_id = match (dto.riot_id_game_name, dto.riot_id_tagline) {
            (Some(name), Some(tag)) if !name.is_empty() && !tag.is_empty() => {
                Some(RiotId::new(name, tag))
            }
            _ => None,
        };
        Participant {
            player_id: PlayerId::new(dto.puuid),
            riot_id,
            champion: dto.champion_name,
            kills: dto.kills,
            deaths: dto.deaths,
            assists: dto.assists,
            win: dto.win,
            team: Team::from_id(dto.team_id),
            role: Role::from_position(&dto.team_position),
        }
    }
}

impl From<MatchDto> for MatchSummary {
    fn from(dto: MatchDto) -> Self {
        MatchSummary {
            match_id: dto.metadata.match_id,
            participants: dto.info.participants.into_iter().map(Into::into).collect(),
        }
    }
}
