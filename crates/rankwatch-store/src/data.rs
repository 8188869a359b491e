//! In-memory document set shared by the store backends.
//!
//! All merge semantics live here so every backend applies them identically.

use crate::error::{StoreError, StoreResult};
use crate::traits::EntityUpsert;
use chrono::Utc;
use rankwatch_core::{ChannelId, GuildId, PlayerId, SubscriberRemoval, TrackedEntity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entities keyed by id plus per-guild delivery channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    entities: BTreeMap<PlayerId, TrackedEntity>,
    #[serde(default)]
    channels: BTreeMap<GuildId, ChannelId>,
}

impl StoreData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities in ascending id order.
    pub fn list_all(&self) -> Vec<TrackedEntity> {
        self.entities.values().cloned().collect()
    }

    pub fn get(&self, id: &PlayerId) -> Option<TrackedEntity> {
        self.entities.get(id).cloned()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Merge `upsert` into the stored record.
    ///
    /// - region is immutable: a different region is a conflict
    /// - `None` fields keep the stored value
    /// - the subscriber (if any) is added to the set, keeping existing
    ///   metadata for guilds already subscribed
    /// - an absent record is only created when a display name and a
    ///   subscriber are supplied
    pub fn upsert(&mut self, upsert: EntityUpsert) -> StoreResult<TrackedEntity> {
        let EntityUpsert {
            id,
            region,
            riot_id,
            rank,
            subscriber,
        } = upsert;

        match self.entities.get_mut(&id) {
            Some(entity) => {
                if entity.region != region {
                    return Err(StoreError::RegionConflict {
                        stored: entity.region,
                        requested: region,
                        id,
                    });
                }
                if let Some(riot_id) = riot_id {
                    entity.riot_id = riot_id;
                }
                if let Some(rank) = rank {
                    entity.rank = Some(rank);
                }
                if let Some((guild, subscription)) = subscriber {
                    entity.add_subscriber(guild, subscription);
                }
                entity.updated_at = Utc::now();
                Ok(entity.clone())
            }
            None => {
                let (Some(riot_id), Some((guild, subscription))) = (riot_id, subscriber) else {
                    return Err(StoreError::NotFound(id));
                };
                let mut entity = TrackedEntity::new(id.clone(), riot_id, region, rank);
                entity.add_subscriber(guild, subscription);
                self.entities.insert(id, entity.clone());
                Ok(entity)
            }
        }
    }

    /// Remove a guild's subscription, deleting the record when it empties.
    pub fn remove_subscriber(&mut self, id: &PlayerId, guild: GuildId) -> SubscriberRemoval {
        let Some(entity) = self.entities.get_mut(id) else {
            return SubscriberRemoval::NotTracked;
        };
        let outcome = entity.remove_subscriber(guild);
        if outcome == SubscriberRemoval::Deleted {
            self.entities.remove(id);
        }
        outcome
    }

    pub fn delete(&mut self, id: &PlayerId) -> bool {
        self.entities.remove(id).is_some()
    }

    pub fn find_by_subscriber(&self, guild: GuildId) -> Vec<TrackedEntity> {
        self.entities
            .values()
            .filter(|e| e.is_subscribed(guild))
            .cloned()
            .collect()
    }

    pub fn channel_for(&self, guild: GuildId) -> Option<ChannelId> {
        self.channels.get(&guild).copied()
    }

    pub fn set_channel(&mut self, guild: GuildId, channel: ChannelId) {
        self.channels.insert(guild, channel);
    }

    pub fn remove_guild(&mut self, guild: GuildId) -> bool {
        self.channels.remove(&guild).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankwatch_core::{Division, RankState, Region, RiotId, Subscription, Tier};

    fn create(id: &str, guild: u64) -> EntityUpsert {
        EntityUpsert::new(PlayerId::new(id), Region::Na1)
            .riot_id(RiotId::new(id, "na1"))
            .rank(RankState::new(Tier::Gold, Division::IV, 80))
            .subscriber(GuildId(guild), Subscription::new(Some(guild * 10)))
    }

    #[test]
    fn test_create_then_merge_subscribers() {
        let mut data = StoreData::new();
        data.upsert(create("a", 1)).unwrap();
        let merged = data.upsert(create("a", 2)).unwrap();

        let guilds: Vec<_> = merged.subscriber_guilds().collect();
        assert_eq!(guilds, vec![GuildId(1), GuildId(2)]);
        assert_eq!(data.entity_count(), 1);
    }

    #[test]
    fn test_rank_update_keeps_subscribers() {
        let mut data = StoreData::new();
        data.upsert(create("a", 1)).unwrap();
        data.upsert(create("a", 2)).unwrap();

        let update = EntityUpsert::new(PlayerId::new("a"), Region::Na1)
            .rank(RankState::new(Tier::Gold, Division::III, 10));
        let merged = data.upsert(update).unwrap();

        assert_eq!(merged.rank, Some(RankState::new(Tier::Gold, Division::III, 10)));
        assert_eq!(merged.subscriber_count(), 2);
        assert_eq!(merged.riot_id, RiotId::new("a", "na1"));
    }

    #[test]
    fn test_update_never_resurrects_deleted_entity() {
        let mut data = StoreData::new();
        let update = EntityUpsert::new(PlayerId::new("gone"), Region::Na1)
            .rank(RankState::unranked());
        assert!(matches!(data.upsert(update), Err(StoreError::NotFound(_))));
        assert_eq!(data.entity_count(), 0);
    }

    #[test]
    fn test_region_is_immutable() {
        let mut data = StoreData::new();
        data.upsert(create("a", 1)).unwrap();
        let mut other = create("a", 2);
        other.region = Region::Euw1;
        assert!(matches!(
            data.upsert(other),
            Err(StoreError::RegionConflict {
                stored: Region::Na1,
                requested: Region::Euw1,
                ..
            })
        ));
        assert_eq!(data.get(&PlayerId::new("a")).unwrap().subscriber_count(), 1);
    }

    #[test]
    fn test_remove_subscriber_deletes_when_last() {
        let mut data = StoreData::new();
        data.upsert(create("a", 1)).unwrap();
        data.upsert(create("a", 2)).unwrap();
        let id = PlayerId::new("a");

        assert_eq!(
            data.remove_subscriber(&id, GuildId(1)),
            SubscriberRemoval::Removed { remaining: 1 }
        );
        let entity = data.get(&id).unwrap();
        assert!(entity.subscription(GuildId(1)).is_none());
        assert_eq!(entity.subscription(GuildId(2)).unwrap().added_by, Some(20));

        assert_eq!(data.remove_subscriber(&id, GuildId(2)), SubscriberRemoval::Deleted);
        assert!(data.get(&id).is_none());
        assert_eq!(data.remove_subscriber(&id, GuildId(2)), SubscriberRemoval::NotTracked);
    }

    #[test]
    fn test_listing_is_ordered_and_filterable() {
        let mut data = StoreData::new();
        data.upsert(create("c", 1)).unwrap();
        data.upsert(create("a", 2)).unwrap();
        data.upsert(create("b", 1)).unwrap();

        let ids: Vec<_> = data.list_all().into_iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let ids: Vec<_> = data
            .find_by_subscriber(GuildId(1))
            .into_iter()
            .map(|e| e.id.0)
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_guild_channels() {
        let mut data = StoreData::new();
        assert_eq!(data.channel_for(GuildId(1)), None);
        data.set_channel(GuildId(1), ChannelId(100));
        data.set_channel(GuildId(1), ChannelId(101));
        assert_eq!(data.channel_for(GuildId(1)), Some(ChannelId(101)));
        assert!(data.remove_guild(GuildId(1)));
        assert!(!data.remove_guild(GuildId(1)));
    }
}
