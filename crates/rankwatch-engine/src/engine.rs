//! Periodic sweep over tracked entities.
//!
//! Per entity: fetch the current ranking, diff it against the stored
//! state, persist a change, then fan it out to the entity's subscribers.
//! The store write always happens before any send, so an interrupted sweep
//! can under-deliver but never replays a stale diff.
//!
//! Sweeps never overlap. The periodic loop drops ticks that fire while a
//! sweep is running, and any other caller gets `SweepInProgress`.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use rankwatch_api::{ApiError, RiotClient};
use rankwatch_core::{GuildId, MatchSummary, RegionClusterTable, SubscriberRef, TrackedEntity};
use rankwatch_detector::{detect, ChangeRecord, Detection};
use rankwatch_notify::{DispatchReport, NotificationDispatcher};
use rankwatch_store::{EntityStore, EntityUpsert, GuildConfigStore, StoreError};
use rankwatch_telemetry::Metrics;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Which entities a sweep visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepScope {
    All,
    /// Manual refresh of one guild's entities.
    Guild(GuildId),
}

impl SweepScope {
    pub fn label(&self) -> &'static str {
        match self {
            SweepScope::All => "all",
            SweepScope::Guild(_) => "guild",
        }
    }
}

impl fmt::Display for SweepScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepScope::All => f.write_str("all"),
            SweepScope::Guild(guild) => write!(f, "guild {guild}"),
        }
    }
}

/// Result of refreshing one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOutcome {
    Unchanged,
    /// First ranking ever stored for the entity; nothing dispatched.
    FirstObservation,
    Changed(DispatchReport),
    /// The entity lost its last subscriber while being refreshed.
    Removed,
    NotFound,
    Unavailable,
    RateLimited,
    /// The change could not be persisted and was not dispatched.
    StoreFailed,
    Failed,
}

impl EntityOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            EntityOutcome::Unchanged => "unchanged",
            EntityOutcome::FirstObservation => "first_observation",
            EntityOutcome::Changed(_) => "changed",
            EntityOutcome::Removed => "removed",
            EntityOutcome::NotFound => "not_found",
            EntityOutcome::Unavailable => "unavailable",
            EntityOutcome::RateLimited => "rate_limited",
            EntityOutcome::StoreFailed => "store_failed",
            EntityOutcome::Failed => "failed",
        }
    }

    /// Whether the pacing delay applies after this entity.
    pub fn needs_pacing(&self) -> bool {
        !matches!(self, EntityOutcome::Unchanged | EntityOutcome::FirstObservation)
    }

    fn from_api_error(error: &ApiError) -> Self {
        match error {
            ApiError::NotFound(_) => EntityOutcome::NotFound,
            ApiError::ServiceUnavailable { .. } => EntityOutcome::Unavailable,
            ApiError::RateLimitExceeded { .. } => EntityOutcome::RateLimited,
            _ => EntityOutcome::Failed,
        }
    }
}

/// A refresh stopped by an error that no other entity can get past
/// (invalid credentials).
#[derive(Debug)]
pub struct FatalRefresh {
    /// What was done for the entity before the error, if anything.
    pub outcome: Option<EntityOutcome>,
    pub error: ApiError,
}

impl FatalRefresh {
    fn before_any_work(error: ApiError) -> Self {
        Self {
            outcome: None,
            error,
        }
    }
}

/// Summary of one sweep.
#[derive(Debug)]
pub struct SweepReport {
    pub sweep_id: Uuid,
    pub scope: SweepScope,
    /// Entities listed at the start of the sweep.
    pub total: usize,
    pub unchanged: usize,
    pub first_observed: usize,
    pub changed: usize,
    pub removed: usize,
    /// Entities skipped because of a per-entity error.
    pub skipped: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    /// Fatal error that stopped the sweep early.
    pub aborted: Option<ApiError>,
    pub elapsed: Duration,
}

impl SweepReport {
    fn new(scope: SweepScope) -> Self {
        Self {
            sweep_id: Uuid::new_v4(),
            scope,
            total: 0,
            unchanged: 0,
            first_observed: 0,
            changed: 0,
            removed: 0,
            skipped: 0,
            notifications_sent: 0,
            notifications_failed: 0,
            aborted: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Entities fully handled (any outcome).
    pub fn processed(&self) -> usize {
        self.unchanged + self.first_observed + self.changed + self.removed + self.skipped
    }

    fn record(&mut self, outcome: &EntityOutcome) {
        match outcome {
            EntityOutcome::Unchanged => self.unchanged += 1,
            EntityOutcome::FirstObservation => self.first_observed += 1,
            EntityOutcome::Changed(dispatch) => {
                self.changed += 1;
                self.notifications_sent += dispatch.sent;
                self.notifications_failed += dispatch.failed;
            }
            EntityOutcome::Removed => self.removed += 1,
            EntityOutcome::NotFound
            | EntityOutcome::Unavailable
            | EntityOutcome::RateLimited
            | EntityOutcome::StoreFailed
            | EntityOutcome::Failed => self.skipped += 1,
        }
    }
}

/// The polling engine.
pub struct PollingEngine {
    client: Arc<RiotClient>,
    store: Arc<dyn EntityStore>,
    guilds: Arc<dyn GuildConfigStore>,
    dispatcher: Arc<NotificationDispatcher>,
    clusters: RegionClusterTable,
    config: EngineConfig,
    sweep_lock: tokio::sync::Mutex<()>,
}

impl PollingEngine {
    pub fn new(
        client: Arc<RiotClient>,
        store: Arc<dyn EntityStore>,
        guilds: Arc<dyn GuildConfigStore>,
        dispatcher: Arc<NotificationDispatcher>,
        clusters: RegionClusterTable,
        config: EngineConfig,
    ) -> Self {
        Self {
            client,
            store,
            guilds,
            dispatcher,
            clusters,
            config,
            sweep_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a sweep (periodic or manual) is running right now.
    pub fn is_sweeping(&self) -> bool {
        self.sweep_lock.try_lock().is_err()
    }

    /// Run sweeps on the configured interval until `cancel` fires.
    ///
    /// Cancellation abandons the in-flight entity; completed entities keep
    /// their persisted state.
    pub async fn run(&self, cancel: CancellationToken) {
        let period = self.config.sweep_interval();
        let start = if self.config.sweep_on_start {
            tokio::time::Instant::now()
        } else {
            tokio::time::Instant::now() + period
        };
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = period.as_secs(), "Polling engine started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            warn!("Sweep cancelled");
                            break;
                        }
                        result = self.run_sweep(SweepScope::All) => match result {
                            Ok(_) => {}
                            Err(EngineError::SweepInProgress) => {
                                debug!("Sweep already running, tick dropped");
                            }
                            Err(e) => error!(error = %e, "Sweep failed"),
                        }
                    }
                }
            }
        }

        info!("Polling engine stopped");
    }

    /// Run one sweep over `scope`.
    ///
    /// Per-entity errors are logged and counted. A fatal API error stops
    /// the sweep and is reported in `SweepReport::aborted`; it is never
    /// returned as `Err`. Only a busy engine or a failed listing is.
    pub async fn run_sweep(&self, scope: SweepScope) -> EngineResult<SweepReport> {
        let Ok(_guard) = self.sweep_lock.try_lock() else {
            Metrics::sweep_finished("skipped");
            return Err(EngineError::SweepInProgress);
        };

        let started = Instant::now();
        let mut report = SweepReport::new(scope);
        let entities = match scope {
            SweepScope::All => self.store.list_all().await?,
            SweepScope::Guild(guild) => self.store.find_by_subscriber(guild).await?,
        };
        report.total = entities.len();
        if scope == SweepScope::All {
            Metrics::tracked_entities(entities.len());
        }
        info!(sweep_id = %report.sweep_id, scope = %scope, entities = report.total, "Sweep started");

        let pacing = self.config.entity_pacing();
        for (index, entity) in entities.iter().enumerate() {
            let outcome = match self.refresh_entity(entity).await {
                Ok(outcome) => outcome,
                Err(fatal) => {
                    if let Some(outcome) = fatal.outcome {
                        Metrics::entity_outcome(outcome.label());
                        report.record(&outcome);
                    }
                    error!(
                        sweep_id = %report.sweep_id,
                        player = %entity.id,
                        error = %fatal.error,
                        "Fatal API error, aborting sweep"
                    );
                    report.aborted = Some(fatal.error);
                    break;
                }
            };
            Metrics::entity_outcome(outcome.label());
            report.record(&outcome);

            let has_next = index + 1 < entities.len();
            if has_next && outcome.needs_pacing() && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
        }

        report.elapsed = started.elapsed();
        Metrics::sweep_duration(scope.label(), report.elapsed.as_secs_f64());
        Metrics::sweep_finished(if report.is_aborted() { "aborted" } else { "completed" });
        info!(
            sweep_id = %report.sweep_id,
            scope = %scope,
            total = report.total,
            unchanged = report.unchanged,
            first_observed = report.first_observed,
            changed = report.changed,
            skipped = report.skipped,
            removed = report.removed,
            sent = report.notifications_sent,
            aborted = report.is_aborted(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Sweep finished"
        );
        Ok(report)
    }

    /// Fetch, diff, persist and dispatch for one entity.
    ///
    /// Returns `Err` only for errors that no other entity can get past
    /// (invalid credentials). If the match fetch hits one after a change
    /// was persisted, the change is still dispatched without match details
    /// and the error carries the `Changed` outcome.
    pub async fn refresh_entity(&self, entity: &TrackedEntity) -> Result<EntityOutcome, FatalRefresh> {
        let current = match self.client.ranked_state(entity.region, &entity.id).await {
            Ok(rank) => rank,
            Err(e) if e.is_fatal() => return Err(FatalRefresh::before_any_work(e)),
            Err(e) => {
                let outcome = EntityOutcome::from_api_error(&e);
                if outcome == EntityOutcome::RateLimited {
                    error!(player = %entity.id, error = %e, "Rate limit budget exhausted, skipping entity");
                } else {
                    warn!(player = %entity.id, riot_id = %entity.riot_id, error = %e, "Ranking fetch failed, skipping entity");
                }
                return Ok(outcome);
            }
        };

        let change = match detect(entity.rank.as_ref(), &current) {
            Detection::Unchanged => return Ok(EntityOutcome::Unchanged),
            Detection::FirstObservation => {
                let upsert = EntityUpsert::new(entity.id.clone(), entity.region).rank(current);
                return Ok(match self.store.upsert(upsert).await {
                    Ok(_) => {
                        debug!(player = %entity.id, rank = %current, "First ranking observed");
                        EntityOutcome::FirstObservation
                    }
                    Err(e) => self.store_failure(entity, e),
                });
            }
            Detection::Changed(change) => change,
        };

        let upsert = EntityUpsert::new(entity.id.clone(), entity.region).rank(current);
        let persisted = match self.store.upsert(upsert).await {
            Ok(persisted) => persisted,
            Err(e) => return Ok(self.store_failure(entity, e)),
        };
        Metrics::change_detected(change.kind.label());
        info!(
            player = %entity.id,
            riot_id = %persisted.riot_id,
            old = %change.old,
            new = %change.new,
            kind = change.kind.label(),
            "Rank change detected"
        );

        let (activity, fatal) = match self.enrichment(&persisted).await {
            Ok(activity) => (activity, None),
            Err(e) => (None, Some(e)),
        };
        let persisted = self.reconcile_identity(persisted, activity.as_ref()).await;
        let outcome = EntityOutcome::Changed(self.dispatch(&persisted, &change, activity).await);
        match fatal {
            Some(error) => Err(FatalRefresh {
                outcome: Some(outcome),
                error,
            }),
            None => Ok(outcome),
        }
    }

    fn store_failure(&self, entity: &TrackedEntity, error: StoreError) -> EntityOutcome {
        match error {
            StoreError::NotFound(_) => {
                debug!(player = %entity.id, "Entity removed during refresh");
                EntityOutcome::Removed
            }
            e => {
                error!(player = %entity.id, error = %e, "Failed to persist ranking, change not applied");
                EntityOutcome::StoreFailed
            }
        }
    }

    /// Most recent match, from the cluster serving the entity's region.
    ///
    /// Only fatal errors are returned; anything else means no details.
    async fn enrichment(&self, entity: &TrackedEntity) -> Result<Option<MatchSummary>, ApiError> {
        if !self.config.enrichment {
            return Ok(None);
        }
        let cluster = self.clusters.cluster_for(entity.region);
        match self.client.recent_match(cluster, &entity.id).await {
            Ok(summary) => Ok(Some(summary)),
            Err(e) if e.is_fatal() => {
                error!(player = %entity.id, error = %e, "Match fetch rejected credentials");
                Err(e)
            }
            Err(e) => {
                warn!(player = %entity.id, cluster = %cluster, error = %e, "No match details, sending without them");
                Ok(None)
            }
        }
    }

    /// Adopt the display name seen in the match if the player renamed.
    ///
    /// Best effort: a failed write is logged and the notification still
    /// uses the new name.
    async fn reconcile_identity(
        &self,
        mut entity: TrackedEntity,
        activity: Option<&MatchSummary>,
    ) -> TrackedEntity {
        let Some(seen) = activity.and_then(|m| m.riot_id_of(&entity.id)) else {
            return entity;
        };
        if seen.same_identity(&entity.riot_id) {
            return entity;
        }

        let seen = seen.normalized();
        info!(player = %entity.id, old = %entity.riot_id, new = %seen, "Player renamed");
        let upsert = EntityUpsert::new(entity.id.clone(), entity.region).riot_id(seen.clone());
        match self.store.upsert(upsert).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(player = %entity.id, error = %e, "Failed to store new display name");
                entity.riot_id = seen;
                entity
            }
        }
    }

    async fn dispatch(
        &self,
        entity: &TrackedEntity,
        change: &ChangeRecord,
        activity: Option<MatchSummary>,
    ) -> DispatchReport {
        let mut subscribers = Vec::with_capacity(entity.subscriber_count());
        for guild in entity.subscriber_guilds() {
            let channel_id = match self.guilds.channel_for(guild).await {
                Ok(channel) => channel,
                Err(e) => {
                    warn!(guild = %guild, error = %e, "Failed to read guild channel");
                    None
                }
            };
            subscribers.push(SubscriberRef {
                guild_id: guild,
                channel_id,
            });
        }
        self.dispatcher
            .dispatch(entity, change, activity, &subscribers)
            .await
    }
}
