//! Interactive notification state.
//!
//! A delivered notification starts minimized and can be toggled between
//! its two views until its lifetime runs out. Expiry edits the message
//! with the toggle disabled; the message stays visible. Toggling only
//! touches the notification's own rendering state, never entity state.

use crate::error::{NotifyError, NotifyResult};
use crate::notifier::{MessageHandle, Notifier};
use crate::render::NotificationView;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use rankwatch_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Live notification.
#[derive(Debug, Clone)]
pub struct InteractiveNotification {
    pub view: Arc<NotificationView>,
    pub expanded: bool,
    pub expires_at: DateTime<Utc>,
}

/// Result of a toggle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Expanded,
    Minimized,
    /// Unknown handle or already expired.
    Inactive,
}

/// Registry of live notifications keyed by message handle.
pub struct NotificationRegistry {
    notifier: Arc<dyn Notifier>,
    live: DashMap<MessageHandle, InteractiveNotification>,
    lifetime: ChronoDuration,
}

impl NotificationRegistry {
    pub fn new(notifier: Arc<dyn Notifier>, lifetime: ChronoDuration) -> Self {
        Self {
            notifier,
            live: DashMap::new(),
            lifetime,
        }
    }

    /// Start tracking a delivered notification. Views without details have
    /// nothing to toggle and are not registered.
    pub fn register(&self, handle: MessageHandle, view: Arc<NotificationView>) {
        self.register_at(handle, view, Utc::now());
    }

    pub fn register_at(
        &self,
        handle: MessageHandle,
        view: Arc<NotificationView>,
        now: DateTime<Utc>,
    ) {
        if !view.has_details() {
            return;
        }
        self.live.insert(
            handle,
            InteractiveNotification {
                view,
                expanded: false,
                expires_at: now + self.lifetime,
            },
        );
        Metrics::interactive_live(self.live.len());
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_expanded(&self, handle: &MessageHandle) -> Option<bool> {
        self.live.get(handle).map(|n| n.expanded)
    }

    /// Flip a notification between minimized and expanded.
    ///
    /// The state only changes if the edit succeeds. A message that is gone
    /// is dropped from the registry.
    pub async fn toggle(&self, handle: &MessageHandle) -> NotifyResult<ToggleOutcome> {
        self.toggle_at(handle, Utc::now()).await
    }

    pub async fn toggle_at(
        &self,
        handle: &MessageHandle,
        now: DateTime<Utc>,
    ) -> NotifyResult<ToggleOutcome> {
        let Some((view, expanded)) = self
            .live
            .get(handle)
            .filter(|n| n.expires_at > now)
            .map(|n| (n.view.clone(), !n.expanded))
        else {
            return Ok(ToggleOutcome::Inactive);
        };

        let content = view.content(expanded);
        match self.notifier.edit(handle, &content).await {
            Ok(()) => {}
            Err(e) if e.is_gone() => {
                self.live.remove(handle);
                Metrics::interactive_live(self.live.len());
                return Ok(ToggleOutcome::Inactive);
            }
            Err(e) => return Err(e),
        }

        if let Some(mut entry) = self.live.get_mut(handle) {
            entry.expanded = expanded;
        }
        Ok(if expanded {
            ToggleOutcome::Expanded
        } else {
            ToggleOutcome::Minimized
        })
    }

    /// Disable every notification whose lifetime ended at or before `now`.
    ///
    /// Returns the number of notifications expired. Messages that were
    /// deleted or became inaccessible are skipped silently.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<MessageHandle> = self
            .live
            .iter()
            .filter(|n| n.expires_at <= now)
            .map(|n| *n.key())
            .collect();

        let mut expired = 0;
        for handle in due {
            let Some((_, notification)) = self.live.remove(&handle) else {
                continue;
            };
            expired += 1;
            let content = notification.view.content(notification.expanded).deactivated();
            match self.notifier.edit(&handle, &content).await {
                Ok(()) => {}
                Err(e) if e.is_gone() => {
                    debug!(message_id = handle.message_id, error = %e, "Expired message is gone");
                }
                Err(NotifyError::RateLimited { retry_after_ms }) => {
                    warn!(
                        message_id = handle.message_id,
                        retry_after_ms, "Rate limited while expiring notification"
                    );
                }
                Err(e) => {
                    warn!(message_id = handle.message_id, error = %e, "Failed to expire notification");
                }
            }
        }

        if expired > 0 {
            debug!(expired, live = self.live.len(), "Expired interactive notifications");
        }
        Metrics::interactive_live(self.live.len());
        expired
    }

    /// Periodically expire notifications until cancelled.
    pub async fn run_reaper(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_secs = interval.as_secs(), "Notification expiry reaper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Notification expiry reaper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.expire_due(Utc::now()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::MockNotifier;
    use rankwatch_core::{
        ChannelId, Division, MatchSummary, Participant, PlayerId, RankState, Region, RiotId, Role,
        Team, Tier,
    };
    use rankwatch_detector::detect;

    fn view(with_activity: bool) -> Arc<NotificationView> {
        let old = RankState::new(Tier::Gold, Division::IV, 80);
        let new = RankState::new(Tier::Gold, Division::IV, 95);
        let activity = with_activity.then(|| MatchSummary {
            match_id: "NA1_1".to_string(),
            participants: vec![Participant {
                player_id: PlayerId::new("me"),
                riot_id: Some(RiotId::new("Me", "na1")),
                champion: "Ahri".to_string(),
                kills: 1,
                deaths: 0,
                assists: 4,
                win: true,
                team: Team::Blue,
                role: Role::Middle,
            }],
        });
        Arc::new(NotificationView {
            player_id: PlayerId::new("me"),
            riot_id: RiotId::new("Me", "na1"),
            region: Region::Na1,
            change: *detect(Some(&old), &new).change().unwrap(),
            activity,
        })
    }

    async fn setup() -> (Arc<MockNotifier>, NotificationRegistry, MessageHandle) {
        let mock = Arc::new(MockNotifier::new());
        let registry = NotificationRegistry::new(mock.clone(), ChronoDuration::hours(72));
        let v = view(true);
        let handle = mock.send(ChannelId(1), &v.content(false)).await.unwrap();
        registry.register(handle, v);
        (mock, registry, handle)
    }

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let (mock, registry, handle) = setup().await;

        assert_eq!(registry.toggle(&handle).await.unwrap(), ToggleOutcome::Expanded);
        assert_eq!(registry.is_expanded(&handle), Some(true));
        assert_eq!(registry.toggle(&handle).await.unwrap(), ToggleOutcome::Minimized);

        let edits = mock.edits();
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].content.embed.title, "Match Summary");
        assert!(edits[1].content.embed.title.starts_with("Rank Update"));
    }

    #[tokio::test]
    async fn test_view_without_details_is_not_registered() {
        let mock = Arc::new(MockNotifier::new());
        let registry = NotificationRegistry::new(mock, ChronoDuration::hours(72));
        let handle = MessageHandle {
            channel_id: ChannelId(1),
            message_id: 1,
        };
        registry.register(handle, view(false));
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.toggle(&handle).await.unwrap(), ToggleOutcome::Inactive);
    }

    #[tokio::test]
    async fn test_expiry_disables_toggle_and_keeps_view() {
        let (mock, registry, handle) = setup().await;
        registry.toggle(&handle).await.unwrap();

        let later = Utc::now() + ChronoDuration::hours(71);
        assert_eq!(registry.expire_due(later).await, 0);

        let after = Utc::now() + ChronoDuration::hours(73);
        assert_eq!(registry.expire_due(after).await, 1);
        assert_eq!(registry.live_count(), 0);

        let last = mock.edits().pop().unwrap();
        assert!(!last.content.is_interactive());
        assert_eq!(last.content.embed.title, "Match Summary");
        assert!(!last.content.links.is_empty());

        assert_eq!(registry.toggle(&handle).await.unwrap(), ToggleOutcome::Inactive);
    }

    #[tokio::test]
    async fn test_expiry_tolerates_deleted_message() {
        let (mock, registry, handle) = setup().await;
        mock.delete_message(handle);

        let after = Utc::now() + ChronoDuration::hours(73);
        assert_eq!(registry.expire_due(after).await, 1);
        assert_eq!(registry.live_count(), 0);
        assert!(mock.edits().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_of_deleted_message_drops_it() {
        let (mock, registry, handle) = setup().await;
        mock.delete_message(handle);
        assert_eq!(registry.toggle(&handle).await.unwrap(), ToggleOutcome::Inactive);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test]
    async fn test_toggle_failure_keeps_state() {
        let (mock, registry, handle) = setup().await;
        mock.fail_channel(
            ChannelId(1),
            NotifyError::Http {
                status: 500,
                message: "boom".to_string(),
            },
        );
        assert!(registry.toggle(&handle).await.is_err());
        assert_eq!(registry.is_expanded(&handle), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_stops_on_cancel() {
        let (_mock, registry, _handle) = setup().await;
        let registry = Arc::new(registry);
        let cancel = CancellationToken::new();
        let task = {
            let registry = registry.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { registry.run_reaper(Duration::from_secs(60), cancel).await })
        };
        tokio::time::sleep(Duration::from_secs(120)).await;
        cancel.cancel();
        task.await.unwrap();
        assert_eq!(registry.live_count(), 1);
    }
}
