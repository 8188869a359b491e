//! Player identity: the immutable upstream key and the mutable display name.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable upstream identifier of a player (PUUID).
///
/// Used as the storage key; never changes for the lifetime of an account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human-readable `name#tag` identity.
///
/// Players can rename themselves upstream, so this is reconciled against
/// fresh activity data rather than used as a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl RiotId {
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            tag_line: tag_line.into(),
        }
    }

    /// Whether two ids name the same account. Tag lines are case-insensitive.
    pub fn same_identity(&self, other: &RiotId) -> bool {
        self.game_name == other.game_name && self.tag_line.eq_ignore_ascii_case(&other.tag_line)
    }

    /// Canonical form: tag line lower-cased, game name kept as typed.
    pub fn normalized(&self) -> RiotId {
        Self::new(self.game_name.clone(), self.tag_line.to_lowercase())
    }

    /// Slug used by third-party profile sites (`name-tag`).
    pub fn profile_slug(&self) -> String {
        format!("{}-{}", self.game_name, self.tag_line)
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

impl TryFrom<String> for RiotId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        match value.split_once('#') {
            Some((name, tag)) if !name.is_empty() && !tag.is_empty() => Ok(Self::new(name, tag)),
            _ => Err(CoreError::InvalidRiotId(value)),
        }
    }
}

impl From<RiotId> for String {
    fn from(id: RiotId) -> Self {
        id.to_string()
    }
}

/// Parse user input of the form `name#tag`.
///
/// Runs of whitespace collapse to a single space, both halves are trimmed
/// and the tag is lower-cased so that equivalent inputs normalize to the
/// same id. Input containing a newline is rejected outright.
pub fn parse_riot_id(input: &str) -> Result<RiotId> {
    let invalid = || CoreError::InvalidRiotId(input.to_string());

    if input.contains('\n') {
        return Err(invalid());
    }

    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut parts = collapsed.split('#');
    let (Some(name), Some(tag), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let name = name.trim();
    let tag = tag.trim();
    if name.is_empty() || tag.is_empty() {
        return Err(invalid());
    }

    Ok(RiotId::new(name, tag).normalized())
}
