//! End-to-end sweeps over scripted upstream responses.

use rankwatch_api::{ApiConfig, RiotClient, ScriptedReply, ScriptedTransport};
use rankwatch_core::{
    ChannelId, Division, GuildId, PlayerId, RankState, Region, RiotId, Subscription, Tier,
};
use rankwatch_engine::{EngineConfig, PollingEngine, SweepScope, TrackingService};
use rankwatch_notify::{MockNotifier, NotificationDispatcher, NotificationRegistry, ToggleOutcome};
use rankwatch_store::{EntityStore, EntityUpsert, GuildConfigStore, JsonFileStore, MemoryStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn api_config() -> ApiConfig {
    ApiConfig {
        host_template: "http://{host}.riot.test".to_string(),
        jitter_ms: 0,
        ..Default::default()
    }
}

fn league(tier: &str, division: &str, points: i32) -> ScriptedReply {
    ScriptedReply::json(json!([{
        "queueType": "RANKED_SOLO_5x5",
        "tier": tier,
        "rank": division,
        "leaguePoints": points,
    }]))
}

fn engine_over<S>(
    transport: Arc<ScriptedTransport>,
    store: Arc<S>,
    notifier: Arc<MockNotifier>,
) -> (Arc<RiotClient>, Arc<PollingEngine>, Arc<NotificationRegistry>)
where
    S: EntityStore + GuildConfigStore + 'static,
{
    let api = api_config();
    let client = Arc::new(RiotClient::with_transport(transport, "key", &api));
    let registry = Arc::new(NotificationRegistry::new(
        notifier.clone(),
        chrono::Duration::hours(72),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        notifier,
        registry.clone(),
        Duration::ZERO,
    ));
    let engine = Arc::new(PollingEngine::new(
        client.clone(),
        store.clone(),
        store,
        dispatcher,
        api.cluster_table(),
        EngineConfig {
            entity_pacing_ms: 0,
            ..Default::default()
        },
    ));
    (client, engine, registry)
}

#[tokio::test(start_paused = true)]
async fn unavailable_entity_does_not_block_the_rest() {
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MockNotifier::new());
    let (_client, engine, _registry) =
        engine_over(transport.clone(), store.clone(), notifier.clone());

    for id in ["pa", "pb"] {
        store
            .upsert(
                EntityUpsert::new(PlayerId::new(id), Region::Na1)
                    .riot_id(RiotId::new(id, "na1"))
                    .rank(RankState::new(Tier::Gold, Division::II, 50))
                    .subscriber(GuildId(1), Subscription::new(None)),
            )
            .await
            .unwrap();
    }
    store.set_channel(GuildId(1), ChannelId(10)).await.unwrap();

    transport.route("entries/by-puuid/pa", vec![ScriptedReply::status(503)]);
    transport.route("entries/by-puuid/pb", vec![league("GOLD", "II", 71)]);

    let report = engine.run_sweep(SweepScope::All).await.unwrap();
    assert!(!report.is_aborted());
    assert_eq!(report.total, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.changed, 1);
    assert_eq!(report.notifications_sent, 1);

    let sent = notifier.sent_to(ChannelId(10));
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].content.embed.description.as_deref(),
        Some("pb#na1 gained 21 LP")
    );

    let pa = store.get(&PlayerId::new("pa")).await.unwrap().unwrap();
    assert_eq!(pa.rank, Some(RankState::new(Tier::Gold, Division::II, 50)));
}

#[tokio::test]
async fn tracked_player_promotion_reaches_the_channel_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("entities.json");
    let transport = Arc::new(ScriptedTransport::new());
    let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
    let notifier = Arc::new(MockNotifier::new());
    let (client, engine, registry) =
        engine_over(transport.clone(), store.clone(), notifier.clone());
    let service = TrackingService::new(client, store.clone(), store.clone(), engine.clone());

    transport.route(
        "by-riot-id/Climber/na1",
        vec![ScriptedReply::json(json!({"puuid": "pc", "gameName": "Climber", "tagLine": "NA1"}))],
    );
    transport.route(
        "na1.riot.test/lol/summoner/v4/summoners/by-puuid/pc",
        vec![ScriptedReply::json(json!({"puuid": "pc", "summonerLevel": 212}))],
    );
    transport.route(
        "entries/by-puuid/pc",
        vec![league("PLATINUM", "I", 98), league("EMERALD", "IV", 0)],
    );
    transport.route("by-puuid/pc/ids", vec![ScriptedReply::json(json!(["NA1_77"]))]);
    transport.route(
        "/matches/NA1_77",
        vec![ScriptedReply::json(json!({
            "metadata": {"matchId": "NA1_77"},
            "info": {"participants": [
                {"puuid": "pc", "riotIdGameName": "Climber", "riotIdTagline": "na1",
                 "championName": "Jinx", "kills": 12, "deaths": 2, "assists": 6,
                 "win": true, "teamId": 100, "teamPosition": "BOTTOM"},
                {"puuid": "px", "riotIdGameName": "Other", "riotIdTagline": "euw",
                 "championName": "Caitlyn", "kills": 3, "deaths": 9, "assists": 1,
                 "win": false, "teamId": 200, "teamPosition": "BOTTOM"}
            ]}
        }))],
    );

    service
        .set_update_channel(GuildId(7), ChannelId(70))
        .await
        .unwrap();
    let entity = service
        .track(GuildId(7), Some(42), "na1", "Climber#NA1")
        .await
        .unwrap();
    assert_eq!(entity.rank, Some(RankState::new(Tier::Platinum, Division::I, 98)));

    let report = service.refresh_guild(GuildId(7)).await.unwrap();
    assert_eq!(report.changed, 1);

    let sent = notifier.sent_to(ChannelId(70));
    assert_eq!(sent.len(), 1);
    let content = &sent[0].content;
    assert_eq!(
        content.embed.description.as_deref(),
        Some("Climber#na1 has PROMOTED from PLATINUM to EMERALD\nJinx (12/2/6)")
    );
    assert!(content.is_interactive());
    assert_eq!(content.links.len(), 2);

    let handle = sent[0].handle;
    assert_eq!(registry.toggle(&handle).await.unwrap(), ToggleOutcome::Expanded);
    assert_eq!(notifier.edits()[0].content.embed.title, "Match Summary");

    drop(service);
    drop(engine);
    drop(store);
    let reopened = JsonFileStore::open(&path).await.unwrap();
    let persisted = reopened.get(&PlayerId::new("pc")).await.unwrap().unwrap();
    assert_eq!(persisted.rank, Some(RankState::new(Tier::Emerald, Division::IV, 0)));
    assert_eq!(persisted.subscription(GuildId(7)).unwrap().added_by, Some(42));
    assert_eq!(reopened.channel_for(GuildId(7)).await.unwrap(), Some(ChannelId(70)));
}
