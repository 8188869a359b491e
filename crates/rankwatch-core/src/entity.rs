//! Tracked entities and their guild subscribers.
//!
//! Per-guild subscription metadata lives in a typed map keyed by guild, so
//! membership and metadata can never drift apart: removing a guild removes
//! both at once.

use crate::identity::{PlayerId, RiotId};
use crate::rank::RankState;
use crate::region::Region;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Chat guild (server) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata recorded when a guild starts tracking an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// User who issued the track command, if known.
    #[serde(default)]
    pub added_by: Option<u64>,
    pub added_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(added_by: Option<u64>) -> Self {
        Self {
            added_by,
            added_at: Utc::now(),
        }
    }
}

/// A subscriber resolved against guild configuration.
///
/// `channel_id` is `None` when the guild never configured a delivery
/// channel; notifications for it are silently suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberRef {
    pub guild_id: GuildId,
    pub channel_id: Option<ChannelId>,
}

/// Outcome of removing one guild from an entity's subscriber set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberRemoval {
    /// No record exists for the entity.
    NotTracked,
    /// The record exists but the guild was not subscribed.
    NotSubscribed,
    /// Guild removed; other subscribers remain.
    Removed { remaining: usize },
    /// Guild was the last subscriber; the record is gone.
    Deleted,
}

/// One externally tracked player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub id: PlayerId,
    /// Current display name, reconciled from activity data.
    pub riot_id: RiotId,
    pub region: Region,
    /// Last observed ranking; `None` if never observed.
    #[serde(default)]
    pub rank: Option<RankState>,
    #[serde(default)]
    subscribers: BTreeMap<GuildId, Subscription>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl TrackedEntity {
    pub fn new(id: PlayerId, riot_id: RiotId, region: Region, rank: Option<RankState>) -> Self {
        Self {
            id,
            riot_id,
            region,
            rank,
            subscribers: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Add a subscriber. Returns `false` if the guild was already subscribed,
    /// in which case the original metadata is kept.
    pub fn add_subscriber(&mut self, guild: GuildId, subscription: Subscription) -> bool {
        if self.subscribers.contains_key(&guild) {
            return false;
        }
        self.subscribers.insert(guild, subscription);
        true
    }

    /// Remove a subscriber and its metadata together.
    ///
    /// Returns `Deleted` when the set became empty; the caller owning the
    /// record must then delete it.
    pub fn remove_subscriber(&mut self, guild: GuildId) -> SubscriberRemoval {
        if self.subscribers.remove(&guild).is_none() {
            return SubscriberRemoval::NotSubscribed;
        }
        match self.subscribers.len() {
            0 => SubscriberRemoval::Deleted,
            remaining => SubscriberRemoval::Removed { remaining },
        }
    }

    pub fn is_subscribed(&self, guild: GuildId) -> bool {
        self.subscribers.contains_key(&guild)
    }

    pub fn subscription(&self, guild: GuildId) -> Option<&Subscription> {
        self.subscribers.get(&guild)
    }

    /// Subscribed guilds in ascending id order.
    pub fn subscriber_guilds(&self) -> impl Iterator<Item = GuildId> + '_ {
        self.subscribers.keys().copied()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }
}
