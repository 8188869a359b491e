//! Upstream routing: platform regions and the regional clusters that serve
//! account and match-history endpoints.
//!
//! Ranking endpoints are served per platform region (e.g. `na1`), while
//! activity history is served per regional cluster (e.g. `americas`). The
//! mapping is an explicit table so it can be tested and overridden from
//! configuration instead of being inferred at call sites.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Platform region a player's ranked profile lives on.
///
/// Immutable once an entity is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Br1,
    Eun1,
    Euw1,
    Jp1,
    Kr,
    La1,
    La2,
    Me1,
    Na1,
    Oc1,
    Ph2,
    Ru,
    Sg2,
    Th2,
    Tr1,
    Tw2,
    Vn2,
}

impl Region {
    pub const ALL: [Region; 17] = [
        Region::Br1,
        Region::Eun1,
        Region::Euw1,
        Region::Jp1,
        Region::Kr,
        Region::La1,
        Region::La2,
        Region::Me1,
        Region::Na1,
        Region::Oc1,
        Region::Ph2,
        Region::Ru,
        Region::Sg2,
        Region::Th2,
        Region::Tr1,
        Region::Tw2,
        Region::Vn2,
    ];

    /// Host prefix used by the upstream API (e.g. "na1").
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Br1 => "br1",
            Region::Eun1 => "eun1",
            Region::Euw1 => "euw1",
            Region::Jp1 => "jp1",
            Region::Kr => "kr",
            Region::La1 => "la1",
            Region::La2 => "la2",
            Region::Me1 => "me1",
            Region::Na1 => "na1",
            Region::Oc1 => "oc1",
            Region::Ph2 => "ph2",
            Region::Ru => "ru",
            Region::Sg2 => "sg2",
            Region::Th2 => "th2",
            Region::Tr1 => "tr1",
            Region::Tw2 => "tw2",
            Region::Vn2 => "vn2",
        }
    }

    /// Geographic name shown in help text.
    pub fn display_name(&self) -> &'static str {
        match self {
            Region::Br1 => "Brazil",
            Region::Eun1 => "Europe Nordic & East",
            Region::Euw1 => "Europe West",
            Region::Jp1 => "Japan",
            Region::Kr => "Korea",
            Region::La1 => "Latin America North",
            Region::La2 => "Latin America South",
            Region::Me1 => "Middle East",
            Region::Na1 => "North America",
            Region::Oc1 => "Oceania",
            Region::Ph2 => "Philippines",
            Region::Ru => "Russia",
            Region::Sg2 => "Singapore, Malaysia & Indonesia",
            Region::Th2 => "Thailand",
            Region::Tr1 => "Turkey",
            Region::Tw2 => "Taiwan, Hong Kong & Macao",
            Region::Vn2 => "Vietnam",
        }
    }

    /// Cluster serving this region's match history.
    pub fn default_cluster(&self) -> Cluster {
        match self {
            Region::Br1 | Region::La1 | Region::La2 | Region::Na1 => Cluster::Americas,
            Region::Eun1 | Region::Euw1 | Region::Me1 | Region::Ru | Region::Tr1 => {
                Cluster::Europe
            }
            Region::Jp1 | Region::Kr => Cluster::Asia,
            Region::Oc1 | Region::Ph2 | Region::Sg2 | Region::Th2 | Region::Tw2 | Region::Vn2 => {
                Cluster::Sea
            }
        }
    }

    /// Comma-separated list of every valid region tag.
    pub fn valid_list() -> String {
        Region::ALL
            .iter()
            .map(Region::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CoreError::InvalidRegion(s.to_string()))
    }
}

/// Regional cluster serving account and match-history endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    Americas,
    Europe,
    Asia,
    Sea,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::Americas => "americas",
            Cluster::Europe => "europe",
            Cluster::Asia => "asia",
            Cluster::Sea => "sea",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "americas" => Ok(Cluster::Americas),
            "europe" => Ok(Cluster::Europe),
            "asia" => Ok(Cluster::Asia),
            "sea" => Ok(Cluster::Sea),
            _ => Err(CoreError::InvalidCluster(s.to_string())),
        }
    }
}

/// Region → cluster routing table for activity lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionClusterTable {
    routes: HashMap<Region, Cluster>,
}

impl RegionClusterTable {
    /// Table with the default route for every region plus `overrides`.
    pub fn with_overrides(overrides: &HashMap<Region, Cluster>) -> Self {
        let mut table = Self::default();
        for (region, cluster) in overrides {
            table.routes.insert(*region, *cluster);
        }
        table
    }

    /// Cluster for `region`. Total: every region has a route.
    pub fn cluster_for(&self, region: Region) -> Cluster {
        self.routes
            .get(&region)
            .copied()
            .unwrap_or_else(|| region.default_cluster())
    }
}

impl Default for RegionClusterTable {
    fn default() -> Self {
        Self {
            routes: Region::ALL
                .iter()
                .map(|r| (*r, r.default_cluster()))
                .collect(),
        }
    }
}

/// Parse a user-supplied region tag.
///
/// Surrounding whitespace is ignored and the tag is case-insensitive; input
/// containing a newline is rejected.
pub fn parse_region(input: &str) -> Result<Region> {
    if input.contains('\n') {
        return Err(CoreError::InvalidRegion(input.to_string()));
    }
    let cleaned = input.trim().to_lowercase();
    if cleaned.is_empty() {
        return Err(CoreError::InvalidRegion(input.to_string()));
    }
    cleaned.parse()
}
