//! Per-subscriber fan-out of one change.
//!
//! Each send is independent: a failure is logged and counted, never
//! retried and never propagated. Subscribers without a delivery channel
//! are skipped.

use crate::interactive::NotificationRegistry;
use crate::notifier::Notifier;
use crate::render::NotificationView;
use rankwatch_core::{MatchSummary, SubscriberRef, TrackedEntity};
use rankwatch_detector::ChangeRecord;
use rankwatch_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome counts of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub no_channel: usize,
    pub failed: usize,
}

pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    registry: Arc<NotificationRegistry>,
    send_pacing: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        registry: Arc<NotificationRegistry>,
        send_pacing: Duration,
    ) -> Self {
        Self {
            notifier,
            registry,
            send_pacing,
        }
    }

    pub fn registry(&self) -> &Arc<NotificationRegistry> {
        &self.registry
    }

    /// Render `change` once and send it to every subscriber with a channel.
    pub async fn dispatch(
        &self,
        entity: &TrackedEntity,
        change: &ChangeRecord,
        activity: Option<MatchSummary>,
        subscribers: &[SubscriberRef],
    ) -> DispatchReport {
        let view = Arc::new(NotificationView::new(entity, *change, activity));
        let content = view.content(false);
        let mut report = DispatchReport::default();
        let mut first = true;

        for subscriber in subscribers {
            let Some(channel) = subscriber.channel_id else {
                debug!(
                    player = %entity.id,
                    guild = %subscriber.guild_id,
                    "No update channel configured, skipping"
                );
                report.no_channel += 1;
                Metrics::notification("no_channel");
                continue;
            };

            if !first && !self.send_pacing.is_zero() {
                tokio::time::sleep(self.send_pacing).await;
            }
            first = false;

            match self.notifier.send(channel, &content).await {
                Ok(handle) => {
                    self.registry.register(handle, view.clone());
                    report.sent += 1;
                    Metrics::notification("sent");
                }
                Err(e) => {
                    warn!(
                        player = %entity.id,
                        guild = %subscriber.guild_id,
                        channel = %channel,
                        error = %e,
                        "Failed to deliver notification"
                    );
                    report.failed += 1;
                    Metrics::notification("failed");
                }
            }
        }

        info!(
            player = %entity.id,
            riot_id = %entity.riot_id,
            kind = change.kind.label(),
            sent = report.sent,
            no_channel = report.no_channel,
            failed = report.failed,
            "Dispatched rank update"
        );
        report
    }
}
