//! Change detection over the closed tier/division order.

use crate::change::{ChangeKind, ChangeLevel, ChangeRecord, Detection};
use rankwatch_core::RankState;
use std::cmp::Ordering;

/// Compare a previously persisted state with a freshly fetched one.
///
/// `None` as previous state means the entity was never observed.
pub fn detect(previous: Option<&RankState>, current: &RankState) -> Detection {
    let Some(old) = previous else {
        return Detection::FirstObservation;
    };

    let (ordering, level) = match old.tier.cmp(&current.tier) {
        Ordering::Equal => match old.division.cmp(&current.division) {
            Ordering::Equal => (old.points.cmp(&current.points), ChangeLevel::Points),
            ordering => (ordering, ChangeLevel::Division),
        },
        ordering => (ordering, ChangeLevel::Tier),
    };

    let kind = match (level, ordering) {
        (_, Ordering::Equal) => return Detection::Unchanged,
        (ChangeLevel::Points, _) => ChangeKind::PointsChange,
        (_, Ordering::Less) => ChangeKind::Promotion,
        (_, Ordering::Greater) => ChangeKind::Demotion,
    };

    Detection::Changed(ChangeRecord {
        old: *old,
        new: *current,
        kind,
        level,
        points_delta: current.points - old.points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankwatch_core::{Division, Tier};

    const POINTS: [i32; 4] = [0, 5, 40, 100];

    fn all_states() -> Vec<RankState> {
        let mut states = Vec::new();
        for tier in Tier::ALL {
            for division in Division::ALL {
                for points in POINTS {
                    states.push(RankState::new(tier, division, points));
                }
            }
        }
        states
    }

    fn changed(old: RankState, new: RankState) -> ChangeRecord {
        match detect(Some(&old), &new) {
            Detection::Changed(record) => record,
            other => panic!("expected change for {old} -> {new}, got {other:?}"),
        }
    }

    #[test]
    fn test_identical_states_never_change() {
        for state in all_states() {
            assert_eq!(detect(Some(&state), &state), Detection::Unchanged, "{state}");
        }
    }

    #[test]
    fn test_every_pair_is_classified_consistently() {
        let states = all_states();
        for old in &states {
            for new in &states {
                let detection = detect(Some(old), new);
                if old == new {
                    assert_eq!(detection, Detection::Unchanged);
                    continue;
                }
                let record = detection
                    .change()
                    .copied()
                    .unwrap_or_else(|| panic!("{old} -> {new} not reported"));

                assert_eq!(record.points_delta, new.points - old.points);
                match record.level {
                    ChangeLevel::Tier => assert_ne!(old.tier, new.tier),
                    ChangeLevel::Division => {
                        assert_eq!(old.tier, new.tier);
                        assert_ne!(old.division, new.division);
                    }
                    ChangeLevel::Points => {
                        assert_eq!((old.tier, old.division), (new.tier, new.division));
                        assert_eq!(record.kind, ChangeKind::PointsChange);
                    }
                }
                if record.level != ChangeLevel::Points {
                    let expected = if old < new {
                        ChangeKind::Promotion
                    } else {
                        ChangeKind::Demotion
                    };
                    assert_eq!(record.kind, expected, "{old} -> {new}");
                }
            }
        }
    }

    #[test]
    fn test_higher_tier_is_promotion_regardless_of_division_and_points() {
        for (i, low) in Tier::ALL.iter().enumerate() {
            for high in &Tier::ALL[i + 1..] {
                let old = RankState::new(*low, Division::I, 100);
                let new = RankState::new(*high, Division::IV, 0);
                let record = changed(old, new);
                assert_eq!(record.kind, ChangeKind::Promotion);
                assert_eq!(record.level, ChangeLevel::Tier);

                let back = changed(new, old);
                assert_eq!(back.kind, ChangeKind::Demotion);
            }
        }
    }

    #[test]
    fn test_division_promotion_dominates_points_loss() {
        let old = RankState::new(Tier::Silver, Division::II, 40);
        let new = RankState::new(Tier::Silver, Division::I, 5);
        let record = changed(old, new);
        assert_eq!(record.kind, ChangeKind::Promotion);
        assert_eq!(record.level, ChangeLevel::Division);
        assert_eq!(record.points_delta, -35);
    }

    #[test]
    fn test_points_gain() {
        let old = RankState::new(Tier::Gold, Division::IV, 80);
        let new = RankState::new(Tier::Gold, Division::IV, 95);
        let record = changed(old, new);
        assert_eq!(record.kind, ChangeKind::PointsChange);
        assert_eq!(record.level, ChangeLevel::Points);
        assert_eq!(record.points_delta, 15);
        assert!(!record.is_promotion() && !record.is_demotion());
    }

    #[test]
    fn test_points_loss() {
        let old = RankState::new(Tier::Gold, Division::IV, 80);
        let new = RankState::new(Tier::Gold, Division::IV, 68);
        assert_eq!(changed(old, new).points_delta, -12);
    }

    #[test]
    fn test_unranked_sentinel_participates() {
        let placed = RankState::new(Tier::Iron, Division::IV, 0);
        assert!(changed(RankState::unranked(), placed).is_promotion());
        assert!(changed(placed, RankState::unranked()).is_demotion());
        assert_eq!(
            detect(Some(&RankState::unranked()), &RankState::unranked()),
            Detection::Unchanged
        );
    }

    #[test]
    fn test_first_observation() {
        let state = RankState::new(Tier::Gold, Division::IV, 80);
        assert_eq!(detect(None, &state), Detection::FirstObservation);
    }
}
