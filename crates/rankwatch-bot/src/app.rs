//! Main application orchestration.
//!
//! Builds every component from [`AppConfig`] and runs the background
//! tasks:
//! - periodic sweep ([`PollingEngine::run`])
//! - interactive notification expiry
//! - periodic statistics summary
//!
//! Only one process sweeps a given snapshot at a time: `run`, `sweep` and
//! `refresh` claim a `<snapshot>.sweep.lock` file first.

use crate::config::{AppConfig, Secrets};
use crate::error::{AppError, AppResult};
use rankwatch_api::RiotClient;
use rankwatch_engine::{PollingEngine, SweepReport, SweepScope, TrackingService};
use rankwatch_notify::{
    DiscordNotifier, LogNotifier, NotificationDispatcher, NotificationRegistry, Notifier,
};
use rankwatch_store::lock::sidecar_path;
use rankwatch_store::{FileLock, JsonFileStore};
use rankwatch_telemetry::SweepStatsReporter;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    store: Arc<JsonFileStore>,
    registry: Arc<NotificationRegistry>,
    engine: Arc<PollingEngine>,
    tracking: TrackingService,
}

impl Application {
    /// Create a new application.
    ///
    /// Opens the snapshot store and picks the chat notifier: REST delivery
    /// when a bot token is present, log output otherwise.
    pub async fn new(config: AppConfig, secrets: &Secrets) -> AppResult<Self> {
        config.validate()?;

        let client = Arc::new(RiotClient::new(secrets.require_api_key()?, &config.api)?);
        let store = Arc::new(JsonFileStore::open(&config.store.path).await?);

        let notifier: Arc<dyn Notifier> = match &secrets.bot_token {
            Some(token) => Arc::new(DiscordNotifier::new(token, &config.notify)?),
            None => {
                warn!("No bot token configured, notifications will only be logged");
                Arc::new(LogNotifier::new())
            }
        };
        let registry = Arc::new(NotificationRegistry::new(
            notifier.clone(),
            config.notify.interactive_lifetime(),
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifier,
            registry.clone(),
            config.notify.send_pacing(),
        ));

        let engine = Arc::new(PollingEngine::new(
            client.clone(),
            store.clone(),
            store.clone(),
            dispatcher,
            config.api.cluster_table(),
            config.engine.clone(),
        ));
        let tracking = TrackingService::new(client, store.clone(), store.clone(), engine.clone());

        info!(
            store = %store.path().display(),
            entities = store.entity_count(),
            sweep_interval_secs = config.engine.sweep_interval_secs,
            "Application initialized"
        );

        Ok(Self {
            config,
            store,
            registry,
            engine,
            tracking,
        })
    }

    pub fn tracking(&self) -> &TrackingService {
        &self.tracking
    }

    pub fn engine(&self) -> &Arc<PollingEngine> {
        &self.engine
    }

    pub fn store(&self) -> &Arc<JsonFileStore> {
        &self.store
    }

    /// Claim the right to sweep the snapshot store until the lock drops.
    ///
    /// Fails with `SweepsClaimed` while another process holds it.
    pub fn claim_sweeps(&self) -> AppResult<FileLock> {
        let path = sidecar_path(&self.config.store.path, ".sweep.lock");
        FileLock::try_acquire(path)?
            .ok_or_else(|| AppError::SweepsClaimed(self.config.store.path.clone()))
    }

    /// Run one full sweep and return its report.
    pub async fn sweep_once(&self) -> AppResult<SweepReport> {
        let _claim = self.claim_sweeps()?;
        Ok(self.engine.run_sweep(SweepScope::All).await?)
    }

    /// Run the background tasks until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let _claim = self.claim_sweeps()?;
        let cancel = CancellationToken::new();

        let engine_handle = {
            let engine = self.engine.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { engine.run(cancel).await })
        };

        let reaper_handle = {
            let registry = self.registry.clone();
            let cancel = cancel.clone();
            let interval = self.config.notify.expiry_scan_interval();
            tokio::spawn(async move { registry.run_reaper(interval, cancel).await })
        };

        let stats_handle = self.config.telemetry.stats_interval().map(|interval| {
            let cancel = cancel.clone();
            tokio::spawn(async move { run_stats_reporter(interval, cancel).await })
        });

        info!("rankwatch running, press Ctrl-C to stop");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received");
        cancel.cancel();

        let mut handles = vec![("engine", engine_handle), ("reaper", reaper_handle)];
        handles.extend(stats_handle.map(|h| ("stats", h)));
        for (name, handle) in handles {
            if let Err(e) = handle.await {
                error!(task = name, error = %e, "Background task panicked");
            }
        }

        info!(entities = self.store.entity_count(), "Shutdown complete");
        Ok(())
    }
}

async fn run_stats_reporter(interval: Duration, cancel: CancellationToken) {
    let reporter = SweepStatsReporter::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                reporter.output_summary();
                break;
            }
            _ = ticker.tick() => reporter.output_summary(),
        }
    }
}
