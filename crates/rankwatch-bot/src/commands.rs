//! Operator command output.

use rankwatch_core::{SubscriberRemoval, TrackedEntity};
use rankwatch_engine::SweepReport;

/// Leaderboard lines, best first, e.g.
/// `**4.** (na1) **Name#tag** - GOLD IV (80 LP)`.
pub fn leaderboard_lines(entities: &[TrackedEntity]) -> Vec<String> {
    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| {
            let position = index + 1;
            let prefix = match position {
                1 => "🥇".to_string(),
                2 => "🥈".to_string(),
                3 => "🥉".to_string(),
                n => format!("**{n}.**"),
            };
            let rank = entity.rank.unwrap_or_default();
            format!(
                "{prefix} ({}) **{}** - {} ({} LP)",
                entity.region,
                entity.riot_id,
                rank.label(),
                rank.points
            )
        })
        .collect()
}

pub fn tracked_message(entity: &TrackedEntity) -> String {
    format!("{} is now being tracked!", entity.riot_id)
}

pub fn untracked_message(riot_id: &str, removal: SubscriberRemoval) -> String {
    match removal {
        SubscriberRemoval::Deleted => format!("{riot_id} is no longer tracked"),
        _ => format!("{riot_id} is no longer tracked in this server"),
    }
}

/// One-line summary of a sweep for the operator.
pub fn sweep_summary(report: &SweepReport) -> String {
    let mut line = format!(
        "Sweep {} ({}): {} entities, {} changed, {} unchanged, {} first seen, {} skipped, {} notifications sent",
        report.sweep_id,
        report.scope,
        report.total,
        report.changed,
        report.unchanged,
        report.first_observed,
        report.skipped,
        report.notifications_sent,
    );
    if let Some(e) = &report.aborted {
        line.push_str(&format!(", aborted: {e}"));
    }
    line
}

/// Message after a successful manual refresh.
pub fn refreshed_message() -> &'static str {
    "Ranked information has been updated."
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankwatch_core::{Division, PlayerId, RankState, Region, RiotId, Tier};

    fn entity(name: &str, region: Region, rank: Option<RankState>) -> TrackedEntity {
        TrackedEntity::new(PlayerId::new(name), RiotId::new(name, "tag"), region, rank)
    }

    #[test]
    fn test_leaderboard_lines() {
        let entities = vec![
            entity("A", Region::Kr, Some(RankState::new(Tier::Challenger, Division::None, 1200))),
            entity("B", Region::Na1, Some(RankState::new(Tier::Gold, Division::II, 40))),
            entity("C", Region::Euw1, Some(RankState::new(Tier::Gold, Division::IV, 5))),
            entity("D", Region::Na1, None),
        ];
        let lines = leaderboard_lines(&entities);
        assert_eq!(lines[0], "🥇 (kr) **A#tag** - CHALLENGER (1200 LP)");
        assert_eq!(lines[1], "🥈 (na1) **B#tag** - GOLD II (40 LP)");
        assert!(lines[2].starts_with("🥉 (euw1)"));
        assert_eq!(lines[3], "**4.** (na1) **D#tag** - UNRANKED (0 LP)");
    }

    #[test]
    fn test_untracked_message() {
        assert_eq!(
            untracked_message("A#tag", SubscriberRemoval::Deleted),
            "A#tag is no longer tracked"
        );
        assert_eq!(
            untracked_message("A#tag", SubscriberRemoval::Removed { remaining: 2 }),
            "A#tag is no longer tracked in this server"
        );
    }
}
