//! Rendering of rank-change notifications.
//!
//! A notification has two views:
//! - minimized: the change sentence plus the tracked player's own line
//!   from the most recent match, coloured by the match result
//! - expanded: the full roster of that match, grouped by team and ordered
//!   by role
//!
//! Without activity data only the minimized view exists.

use crate::content::{
    Embed, MessageContent, ToggleButton, COLOUR_LOSS, COLOUR_NO_ACTIVITY, COLOUR_SUMMARY,
    COLOUR_WIN,
};
use crate::links::profile_links;
use rankwatch_core::{MatchSummary, PlayerId, Region, RiotId, Team, TrackedEntity};
use rankwatch_detector::{ChangeKind, ChangeLevel, ChangeRecord};

pub const EXPAND_LABEL: &str = "Show Match Details";
pub const MINIMIZE_LABEL: &str = "Show Minimized View";

/// Everything needed to render one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub player_id: PlayerId,
    pub riot_id: RiotId,
    pub region: Region,
    pub change: ChangeRecord,
    pub activity: Option<MatchSummary>,
}

impl NotificationView {
    pub fn new(entity: &TrackedEntity, change: ChangeRecord, activity: Option<MatchSummary>) -> Self {
        Self {
            player_id: entity.id.clone(),
            riot_id: entity.riot_id.clone(),
            region: entity.region,
            change,
            activity,
        }
    }

    pub fn has_details(&self) -> bool {
        self.activity.is_some()
    }

    pub fn minimized(&self) -> Embed {
        let mut description = change_sentence(&self.riot_id, &self.change);
        let own_line = self
            .activity
            .as_ref()
            .and_then(|m| m.participant(&self.player_id));

        let color = match own_line {
            Some(p) => {
                description.push_str(&format!("\n{} ({})", p.champion, p.kda()));
                if p.win {
                    COLOUR_WIN
                } else {
                    COLOUR_LOSS
                }
            }
            None => COLOUR_NO_ACTIVITY,
        };

        Embed::new(format!("Rank Update ({})", self.region), color).description(description)
    }

    /// `None` when no activity is attached.
    pub fn expanded(&self) -> Option<Embed> {
        let activity = self.activity.as_ref()?;
        let roster = activity.ordered_roster();
        let team_lines = |team: Team| {
            roster
                .iter()
                .filter(|p| p.team == team)
                .map(|p| format!("**{}** - {} ({})", p.display_name(), p.champion, p.kda()))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Some(
            Embed::new("Match Summary", COLOUR_SUMMARY)
                .field(Team::Blue.to_string(), team_lines(Team::Blue))
                .field(Team::Red.to_string(), team_lines(Team::Red)),
        )
    }

    /// Full message for the given toggle state.
    pub fn content(&self, expanded: bool) -> MessageContent {
        let links = profile_links(&self.riot_id, self.region);
        match (expanded, self.expanded()) {
            (true, Some(embed)) => MessageContent {
                embed,
                links,
                toggle: Some(ToggleButton {
                    label: MINIMIZE_LABEL.to_string(),
                    disabled: false,
                }),
            },
            (_, details) => MessageContent {
                embed: self.minimized(),
                links,
                toggle: details.map(|_| ToggleButton {
                    label: EXPAND_LABEL.to_string(),
                    disabled: false,
                }),
            },
        }
    }
}

/// One-line description of a change, e.g. `X has PROMOTED from SILVER to GOLD`.
pub fn change_sentence(riot_id: &RiotId, change: &ChangeRecord) -> String {
    let verb = match change.kind {
        ChangeKind::Promotion => "PROMOTED",
        ChangeKind::Demotion => "DEMOTED",
        ChangeKind::PointsChange => {
            return if change.points_delta < 0 {
                format!("{riot_id} lost {} LP", change.points_delta.unsigned_abs())
            } else {
                format!("{riot_id} gained {} LP", change.points_delta)
            };
        }
    };

    match change.level {
        ChangeLevel::Tier => format!(
            "{riot_id} has {verb} from {} to {}",
            change.old.tier, change.new.tier
        ),
        _ => format!(
            "{riot_id} has {verb} from {} to {}",
            change.old.label(),
            change.new.label()
        ),
    }
}
