//! Store collaborator traits.

use crate::error::StoreResult;
use rankwatch_core::{
    BoxFuture, ChannelId, GuildId, PlayerId, RankState, Region, RiotId, SubscriberRemoval,
    Subscription, TrackedEntity,
};

/// Merge request for one entity.
///
/// Fields left `None` keep their stored value. A subscriber is added to the
/// existing set, never replacing it. Creating a record requires a
/// subscriber, so an update racing with the removal of the last subscriber
/// cannot resurrect an orphaned entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityUpsert {
    pub id: PlayerId,
    pub region: Region,
    pub riot_id: Option<RiotId>,
    pub rank: Option<RankState>,
    pub subscriber: Option<(GuildId, Subscription)>,
}

impl EntityUpsert {
    pub fn new(id: PlayerId, region: Region) -> Self {
        Self {
            id,
            region,
            riot_id: None,
            rank: None,
            subscriber: None,
        }
    }

    pub fn riot_id(mut self, riot_id: RiotId) -> Self {
        self.riot_id = Some(riot_id);
        self
    }

    pub fn rank(mut self, rank: RankState) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn subscriber(mut self, guild: GuildId, subscription: Subscription) -> Self {
        self.subscriber = Some((guild, subscription));
        self
    }
}

/// Tracked-entity store.
///
/// Listing order is stable (ascending entity id) so a sweep visits entities
/// in a repeatable order.
pub trait EntityStore: Send + Sync {
    fn list_all(&self) -> BoxFuture<'_, StoreResult<Vec<TrackedEntity>>>;

    fn get<'a>(&'a self, id: &'a PlayerId) -> BoxFuture<'a, StoreResult<Option<TrackedEntity>>>;

    /// Merge `upsert` into the stored record and return the merged record.
    fn upsert(&self, upsert: EntityUpsert) -> BoxFuture<'_, StoreResult<TrackedEntity>>;

    /// Remove one guild's subscription; deletes the record if it was the last.
    fn remove_subscriber<'a>(
        &'a self,
        id: &'a PlayerId,
        guild: GuildId,
    ) -> BoxFuture<'a, StoreResult<SubscriberRemoval>>;

    /// Returns `false` if no record existed.
    fn delete<'a>(&'a self, id: &'a PlayerId) -> BoxFuture<'a, StoreResult<bool>>;

    fn find_by_subscriber(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<Vec<TrackedEntity>>>;
}

/// Per-guild configuration store.
pub trait GuildConfigStore: Send + Sync {
    fn channel_for(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<Option<ChannelId>>>;

    fn set_channel(&self, guild: GuildId, channel: ChannelId) -> BoxFuture<'_, StoreResult<()>>;

    /// Returns `false` if the guild had no configuration.
    fn remove(&self, guild: GuildId) -> BoxFuture<'_, StoreResult<bool>>;
}
