//! Ranking state: tier, division and points.
//!
//! Both `Tier` and `Division` are closed enums whose variant declaration order
//! IS the ranking order, so `Ord` is derived rather than looked up in a table.
//! Every representable value (including the `Unranked` / `None` sentinels)
//! participates in the order.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Ranked tier, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    /// No ranked placement in the tracked queue.
    Unranked,
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl Tier {
    /// Every tier, lowest first.
    pub const ALL: [Tier; 11] = [
        Tier::Unranked,
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Emerald,
        Tier::Diamond,
        Tier::Master,
        Tier::Grandmaster,
        Tier::Challenger,
    ];

    /// Upstream wire name (e.g. "GOLD").
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Unranked => "UNRANKED",
            Tier::Iron => "IRON",
            Tier::Bronze => "BRONZE",
            Tier::Silver => "SILVER",
            Tier::Gold => "GOLD",
            Tier::Platinum => "PLATINUM",
            Tier::Emerald => "EMERALD",
            Tier::Diamond => "DIAMOND",
            Tier::Master => "MASTER",
            Tier::Grandmaster => "GRANDMASTER",
            Tier::Challenger => "CHALLENGER",
        }
    }

    /// Apex tiers have a single ladder and no divisions.
    pub fn is_apex(&self) -> bool {
        matches!(self, Tier::Master | Tier::Grandmaster | Tier::Challenger)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Tier::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| CoreError::InvalidTier(s.to_string()))
    }
}

/// Division within a tier, lowest first.
///
/// `None` is used for unranked players and apex tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Division {
    #[default]
    #[serde(rename = "")]
    None,
    IV,
    III,
    II,
    I,
}

impl Division {
    /// Every division, lowest first.
    pub const ALL: [Division; 5] = [
        Division::None,
        Division::IV,
        Division::III,
        Division::II,
        Division::I,
    ];

    /// Upstream wire name ("" for no division).
    pub fn as_str(&self) -> &'static str {
        match self {
            Division::None => "",
            Division::IV => "IV",
            Division::III => "III",
            Division::II => "II",
            Division::I => "I",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Division {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Division::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == upper)
            .ok_or_else(|| CoreError::InvalidDivision(s.to_string()))
    }
}

/// Observed ranking of a player in the tracked queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankState {
    pub tier: Tier,
    #[serde(default)]
    pub division: Division,
    /// League points within the division.
    #[serde(default)]
    pub points: i32,
}

impl RankState {
    pub fn new(tier: Tier, division: Division, points: i32) -> Self {
        Self {
            tier,
            division,
            points,
        }
    }

    /// State reported for players without a placement.
    pub fn unranked() -> Self {
        Self::new(Tier::Unranked, Division::None, 0)
    }

    pub fn is_unranked(&self) -> bool {
        self.tier == Tier::Unranked
    }

    /// Short label, e.g. "GOLD IV" or "MASTER".
    pub fn label(&self) -> String {
        if self.division == Division::None {
            self.tier.to_string()
        } else {
            format!("{} {}", self.tier, self.division)
        }
    }
}

impl Default for RankState {
    fn default() -> Self {
        Self::unranked()
    }
}

impl PartialOrd for RankState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic over (tier, division, points).
impl Ord for RankState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then(self.division.cmp(&other.division))
            .then(self.points.cmp(&other.points))
    }
}

impl fmt::Display for RankState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} LP)", self.label(), self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order_is_total() {
        for window in Tier::ALL.windows(2) {
            assert!(window[0] < window[1], "{} < {}", window[0], window[1]);
        }
        assert_eq!(Tier::ALL.iter().min(), Some(&Tier::Unranked));
        assert_eq!(Tier::ALL.iter().max(), Some(&Tier::Challenger));
    }

    #[test]
    fn test_division_order() {
        assert!(Division::None < Division::IV);
        assert!(Division::IV < Division::III);
        assert!(Division::II < Division::I);
    }

    #[test]
    fn test_parse_roundtrip_names() {
        for tier in Tier::ALL {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        for division in Division::ALL {
            assert_eq!(division.as_str().parse::<Division>().unwrap(), division);
        }
        assert_eq!("gold".parse::<Tier>().unwrap(), Tier::Gold);
        assert!("WOOD".parse::<Tier>().is_err());
        assert!("V".parse::<Division>().is_err());
    }

    #[test]
    fn test_serde_wire_format() {
        let state = RankState::new(Tier::Silver, Division::II, 40);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"tier":"SILVER","division":"II","points":40}"#);

        let unranked: RankState =
            serde_json::from_str(r#"{"tier":"UNRANKED","division":""}"#).unwrap();
        assert_eq!(unranked, RankState::unranked());
    }

    #[test]
    fn test_rank_state_ordering() {
        let silver_two = RankState::new(Tier::Silver, Division::II, 90);
        let silver_one = RankState::new(Tier::Silver, Division::I, 0);
        let gold_four = RankState::new(Tier::Gold, Division::IV, 0);
        assert!(silver_two < silver_one);
        assert!(silver_one < gold_four);
        assert!(RankState::unranked() < silver_two);
    }

    #[test]
    fn test_label() {
        assert_eq!(RankState::new(Tier::Gold, Division::IV, 80).label(), "GOLD IV");
        assert_eq!(RankState::new(Tier::Master, Division::None, 120).label(), "MASTER");
        assert!(Tier::Grandmaster.is_apex());
        assert!(!Tier::Diamond.is_apex());
    }
}
