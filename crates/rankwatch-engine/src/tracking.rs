//! User-facing tracking commands.
//!
//! Every write goes through the same merge upsert the sweep uses, so a
//! command racing a sweep cannot clobber the subscriber set.

use crate::engine::{PollingEngine, SweepReport, SweepScope};
use crate::error::{CommandError, CommandResult};
use rankwatch_api::{ApiError, RiotClient};
use rankwatch_core::{
    parse_region, parse_riot_id, ChannelId, GuildId, PlayerId, RiotId, SubscriberRemoval,
    Subscription, TrackedEntity,
};
use rankwatch_store::{EntityStore, EntityUpsert, GuildConfigStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

/// What removing a guild cleaned up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuildRemoval {
    /// Entities the guild stopped tracking.
    pub untracked: usize,
    /// Entities deleted because the guild was their last subscriber.
    pub deleted: usize,
    pub had_channel: bool,
}

pub struct TrackingService {
    client: Arc<RiotClient>,
    store: Arc<dyn EntityStore>,
    guilds: Arc<dyn GuildConfigStore>,
    engine: Arc<PollingEngine>,
}

impl TrackingService {
    pub fn new(
        client: Arc<RiotClient>,
        store: Arc<dyn EntityStore>,
        guilds: Arc<dyn GuildConfigStore>,
        engine: Arc<PollingEngine>,
    ) -> Self {
        Self {
            client,
            store,
            guilds,
            engine,
        }
    }

    async fn resolve(&self, riot_id: &RiotId) -> CommandResult<PlayerId> {
        match self.client.account_by_riot_id(riot_id).await {
            Ok(id) => Ok(id),
            Err(ApiError::NotFound(_)) => Err(CommandError::PlayerNotFound(riot_id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Start tracking `riot_input` on `region_input` for `guild`.
    pub async fn track(
        &self,
        guild: GuildId,
        added_by: Option<u64>,
        region_input: &str,
        riot_input: &str,
    ) -> CommandResult<TrackedEntity> {
        let region = parse_region(region_input)
            .map_err(|_| CommandError::InvalidRegion(region_input.trim().to_string()))?;
        let riot_id =
            parse_riot_id(riot_input).map_err(|_| CommandError::InvalidRiotId(riot_input.to_string()))?;
        let id = self.resolve(&riot_id).await?;

        let existing = self.store.get(&id).await?;
        if let Some(entity) = &existing {
            if entity.region != region {
                return Err(CommandError::RegionConflict {
                    riot_id,
                    stored: entity.region,
                });
            }
            if entity.is_subscribed(guild) {
                return Err(CommandError::AlreadyTracked(riot_id));
            }
        }

        if self.client.summoner_by_puuid(region, &id).await?.is_none() {
            return Err(CommandError::NotOnRegion { riot_id, region });
        }

        let mut upsert = EntityUpsert::new(id.clone(), region)
            .riot_id(riot_id.clone())
            .subscriber(guild, Subscription::new(added_by));
        // An existing record keeps its stored ranking so the next sweep
        // still reports any pending change to its other subscribers.
        if existing.is_none() {
            upsert = upsert.rank(self.client.ranked_state(region, &id).await?);
        }

        let entity = match self.store.upsert(upsert).await {
            Ok(entity) => entity,
            Err(StoreError::RegionConflict { stored, .. }) => {
                return Err(CommandError::RegionConflict { riot_id, stored });
            }
            Err(e) => return Err(e.into()),
        };
        info!(guild = %guild, player = %id, riot_id = %riot_id, region = %region, "Player tracked");
        Ok(entity)
    }

    /// Stop tracking `riot_input` for `guild`. Removing the last subscriber
    /// deletes the record.
    pub async fn untrack(&self, guild: GuildId, riot_input: &str) -> CommandResult<SubscriberRemoval> {
        let riot_id =
            parse_riot_id(riot_input).map_err(|_| CommandError::InvalidRiotId(riot_input.to_string()))?;
        let id = self.resolve(&riot_id).await?;

        match self.store.remove_subscriber(&id, guild).await? {
            SubscriberRemoval::NotTracked => Err(CommandError::NotTracked(riot_id)),
            SubscriberRemoval::NotSubscribed => Err(CommandError::NotTrackedInGuild(riot_id)),
            outcome => {
                info!(guild = %guild, player = %id, ?outcome, "Player untracked");
                Ok(outcome)
            }
        }
    }

    pub async fn set_update_channel(&self, guild: GuildId, channel: ChannelId) -> CommandResult<()> {
        self.guilds.set_channel(guild, channel).await?;
        info!(guild = %guild, channel = %channel, "Update channel set");
        Ok(())
    }

    /// Forget a guild entirely: its channel and every subscription it holds.
    pub async fn remove_guild(&self, guild: GuildId) -> CommandResult<GuildRemoval> {
        let mut removal = GuildRemoval::default();
        for entity in self.store.find_by_subscriber(guild).await? {
            match self.store.remove_subscriber(&entity.id, guild).await {
                Ok(SubscriberRemoval::Deleted) => {
                    removal.untracked += 1;
                    removal.deleted += 1;
                }
                Ok(SubscriberRemoval::Removed { .. }) => removal.untracked += 1,
                Ok(_) => {}
                Err(e) => warn!(guild = %guild, player = %entity.id, error = %e, "Failed to untrack"),
            }
        }
        removal.had_channel = self.guilds.remove(guild).await?;
        info!(
            guild = %guild,
            untracked = removal.untracked,
            deleted = removal.deleted,
            "Guild removed"
        );
        Ok(removal)
    }

    /// Entities tracked by `guild`, best ranking first.
    ///
    /// Ties keep a stable order by display name.
    pub async fn leaderboard(&self, guild: GuildId) -> CommandResult<Vec<TrackedEntity>> {
        let mut entities = self.store.find_by_subscriber(guild).await?;
        if entities.is_empty() {
            return Err(CommandError::NothingTracked);
        }
        entities.sort_by(|a, b| {
            b.rank
                .unwrap_or_default()
                .cmp(&a.rank.unwrap_or_default())
                .then_with(|| a.riot_id.to_string().cmp(&b.riot_id.to_string()))
        });
        Ok(entities)
    }

    /// Manual update of one guild's entities through the sweep path.
    pub async fn refresh_guild(&self, guild: GuildId) -> CommandResult<SweepReport> {
        let mut report = self.engine.run_sweep(SweepScope::Guild(guild)).await?;
        if report.total == 0 {
            return Err(CommandError::NothingTracked);
        }
        if let Some(e) = report.aborted.take() {
            return Err(CommandError::Api(e));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use rankwatch_api::{ApiConfig, ScriptedReply, ScriptedTransport};
    use rankwatch_core::{Division, RankState, Region, Tier};
    use rankwatch_notify::{MockNotifier, NotificationDispatcher, NotificationRegistry};
    use rankwatch_store::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        transport: Arc<ScriptedTransport>,
        store: Arc<MemoryStore>,
        service: TrackingService,
    }

    fn harness() -> Harness {
        let transport = Arc::new(ScriptedTransport::new());
        let api = ApiConfig {
            host_template: "http://{host}.riot.test".to_string(),
            jitter_ms: 0,
            ..Default::default()
        };
        let client = Arc::new(RiotClient::with_transport(transport.clone(), "key", &api));
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MockNotifier::new());
        let registry = Arc::new(NotificationRegistry::new(
            notifier.clone(),
            chrono::Duration::hours(72),
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(notifier, registry, Duration::ZERO));
        let engine = Arc::new(PollingEngine::new(
            client.clone(),
            store.clone(),
            store.clone(),
            dispatcher,
            api.cluster_table(),
            EngineConfig {
                entity_pacing_ms: 0,
                ..Default::default()
            },
        ));
        let service = TrackingService::new(client, store.clone(), store.clone(), engine);
        Harness {
            transport,
            store,
            service,
        }
    }

    /// Scripts account, summoner and ranking lookups for one player on na1.
    fn player(h: &Harness, name: &str, id: &str, tier: &str, division: &str, points: i32) {
        h.transport.route(
            format!("by-riot-id/{name}/"),
            vec![ScriptedReply::json(json!({"puuid": id, "gameName": name, "tagLine": "na1"}))],
        );
        h.transport.route(
            format!("na1.riot.test/lol/summoner/v4/summoners/by-puuid/{id}"),
            vec![ScriptedReply::json(json!({"puuid": id, "summonerLevel": 100}))],
        );
        h.transport.route(
            format!("entries/by-puuid/{id}"),
            vec![ScriptedReply::json(json!([{
                "queueType": "RANKED_SOLO_5x5",
                "tier": tier,
                "rank": division,
                "leaguePoints": points,
            }]))],
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_track_creates_and_merges() {
        let h = harness();
        player(&h, "Alpha", "pa", "GOLD", "IV", 80);

        let entity = h.service.track(GuildId(1), Some(9), "NA1", "Alpha#NA1").await.unwrap();
        assert_eq!(entity.riot_id, RiotId::new("Alpha", "na1"));
        assert_eq!(entity.rank, Some(RankState::new(Tier::Gold, Division::IV, 80)));

        let entity = h.service.track(GuildId(2), None, "na1", "Alpha#na1").await.unwrap();
        assert_eq!(entity.subscriber_count(), 2);
        assert_eq!(entity.subscription(GuildId(1)).unwrap().added_by, Some(9));

        assert!(matches!(
            h.service.track(GuildId(1), None, "na1", "Alpha#na1").await,
            Err(CommandError::AlreadyTracked(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_track_validates_input_and_region() {
        let h = harness();
        player(&h, "Alpha", "pa", "GOLD", "IV", 80);

        assert!(matches!(
            h.service.track(GuildId(1), None, "mars", "Alpha#na1").await,
            Err(CommandError::InvalidRegion(_))
        ));
        assert!(matches!(
            h.service.track(GuildId(1), None, "na1", "Alpha").await,
            Err(CommandError::InvalidRiotId(_))
        ));
        assert!(matches!(
            h.service.track(GuildId(1), None, "na1", "Nobody#na1").await,
            Err(CommandError::PlayerNotFound(_))
        ));
        assert!(matches!(
            h.service.track(GuildId(1), None, "euw1", "Alpha#na1").await,
            Err(CommandError::NotOnRegion { region: Region::Euw1, .. })
        ));
        assert_eq!(h.store.entity_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_track_rejects_second_region() {
        let h = harness();
        player(&h, "Alpha", "pa", "GOLD", "IV", 80);
        h.service.track(GuildId(1), None, "na1", "Alpha#na1").await.unwrap();

        assert!(matches!(
            h.service.track(GuildId(2), None, "euw1", "Alpha#na1").await,
            Err(CommandError::RegionConflict { stored: Region::Na1, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_untrack_last_subscriber_deletes() {
        let h = harness();
        player(&h, "Alpha", "pa", "GOLD", "IV", 80);
        h.service.track(GuildId(1), None, "na1", "Alpha#na1").await.unwrap();
        h.service.track(GuildId(2), None, "na1", "Alpha#na1").await.unwrap();

        assert_eq!(
            h.service.untrack(GuildId(1), "Alpha#na1").await.unwrap(),
            SubscriberRemoval::Removed { remaining: 1 }
        );
        assert!(matches!(
            h.service.untrack(GuildId(1), "Alpha#na1").await,
            Err(CommandError::NotTrackedInGuild(_))
        ));
        assert_eq!(
            h.service.untrack(GuildId(2), "Alpha#na1").await.unwrap(),
            SubscriberRemoval::Deleted
        );
        assert_eq!(h.store.entity_count(), 0);
        assert!(matches!(
            h.service.untrack(GuildId(2), "Alpha#na1").await,
            Err(CommandError::NotTracked(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaderboard_order() {
        let h = harness();
        player(&h, "Alpha", "pa", "GOLD", "IV", 80);
        player(&h, "Bravo", "pb", "DIAMOND", "II", 10);
        player(&h, "Charlie", "pc", "GOLD", "IV", 80);
        player(&h, "Delta", "pd", "GOLD", "I", 0);
        for name in ["Charlie", "Alpha", "Bravo", "Delta"] {
            h.service
                .track(GuildId(1), None, "na1", &format!("{name}#na1"))
                .await
                .unwrap();
        }

        let names: Vec<String> = h
            .service
            .leaderboard(GuildId(1))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.riot_id.game_name)
            .collect();
        assert_eq!(names, vec!["Bravo", "Delta", "Alpha", "Charlie"]);

        assert!(matches!(
            h.service.leaderboard(GuildId(5)).await,
            Err(CommandError::NothingTracked)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_guild_untracks_everything() {
        let h = harness();
        player(&h, "Alpha", "pa", "GOLD", "IV", 80);
        player(&h, "Bravo", "pb", "GOLD", "IV", 80);
        h.service.track(GuildId(1), None, "na1", "Alpha#na1").await.unwrap();
        h.service.track(GuildId(1), None, "na1", "Bravo#na1").await.unwrap();
        h.service.track(GuildId(2), None, "na1", "Bravo#na1").await.unwrap();
        h.service
            .set_update_channel(GuildId(1), ChannelId(100))
            .await
            .unwrap();

        let removal = h.service.remove_guild(GuildId(1)).await.unwrap();
        assert_eq!(
            removal,
            GuildRemoval {
                untracked: 2,
                deleted: 1,
                had_channel: true
            }
        );
        assert_eq!(h.store.entity_count(), 1);
        assert_eq!(h.store.channel_for(GuildId(1)).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_guild_surfaces_fatal_errors() {
        let h = harness();
        player(&h, "Alpha", "pa", "GOLD", "IV", 80);
        h.service.track(GuildId(1), None, "na1", "Alpha#na1").await.unwrap();

        let report = h.service.refresh_guild(GuildId(1)).await.unwrap();
        assert_eq!(report.unchanged, 1);

        h.transport
            .reroute("entries/by-puuid/pa", vec![ScriptedReply::status(401)]);
        let err = h.service.refresh_guild(GuildId(1)).await.unwrap_err();
        assert!(matches!(err, CommandError::Api(ApiError::Auth { status: 401 })));
        assert!(err.user_message().contains("API key"));

        assert!(matches!(
            h.service.refresh_guild(GuildId(9)).await,
            Err(CommandError::NothingTracked)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_guild_reports_rejected_key_on_match_fetch() {
        let h = harness();
        player(&h, "Alpha", "pa", "GOLD", "IV", 80);
        h.service.track(GuildId(1), None, "na1", "Alpha#na1").await.unwrap();

        h.transport.reroute(
            "entries/by-puuid/pa",
            vec![ScriptedReply::json(json!([{
                "queueType": "RANKED_SOLO_5x5",
                "tier": "GOLD",
                "rank": "IV",
                "leaguePoints": 95,
            }]))],
        );
        h.transport.route("by-puuid/pa/ids", vec![ScriptedReply::status(403)]);

        let err = h.service.refresh_guild(GuildId(1)).await.unwrap_err();
        assert!(matches!(err, CommandError::Api(ApiError::Auth { status: 403 })));
        let stored = h.store.get(&PlayerId::new("pa")).await.unwrap().unwrap();
        assert_eq!(stored.rank.unwrap().points, 95);
    }
}
