//! Outbound notification seam.
//!
//! The dispatcher and the interactive registry only see [`Notifier`], so
//! delivery can be swapped between the chat REST API, plain logging and a
//! recording mock.

use crate::content::MessageContent;
use crate::error::{NotifyError, NotifyResult};
use parking_lot::Mutex;
use rankwatch_core::{BoxFuture, ChannelId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Handle of a delivered message, used to edit it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    pub channel_id: ChannelId,
    pub message_id: u64,
}

pub trait Notifier: Send + Sync {
    fn send<'a>(
        &'a self,
        channel: ChannelId,
        content: &'a MessageContent,
    ) -> BoxFuture<'a, NotifyResult<MessageHandle>>;

    fn edit<'a>(
        &'a self,
        handle: &'a MessageHandle,
        content: &'a MessageContent,
    ) -> BoxFuture<'a, NotifyResult<()>>;
}

/// Notifier that only logs. Used when no chat credentials are configured.
#[derive(Debug, Default)]
pub struct LogNotifier {
    next_id: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for LogNotifier {
    fn send<'a>(
        &'a self,
        channel: ChannelId,
        content: &'a MessageContent,
    ) -> BoxFuture<'a, NotifyResult<MessageHandle>> {
        Box::pin(async move {
            let message_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            info!(
                channel = %channel,
                message_id,
                title = %content.embed.title,
                description = content.embed.description.as_deref().unwrap_or(""),
                "Notification"
            );
            Ok(MessageHandle {
                channel_id: channel,
                message_id,
            })
        })
    }

    fn edit<'a>(
        &'a self,
        handle: &'a MessageHandle,
        content: &'a MessageContent,
    ) -> BoxFuture<'a, NotifyResult<()>> {
        Box::pin(async move {
            info!(
                channel = %handle.channel_id,
                message_id = handle.message_id,
                title = %content.embed.title,
                interactive = content.is_interactive(),
                "Notification edited"
            );
            Ok(())
        })
    }
}

/// A message recorded by [`MockNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub handle: MessageHandle,
    pub content: MessageContent,
}

/// Recording notifier for testing.
///
/// Failures can be injected per channel, and messages can be "deleted" so
/// later edits fail with `NotFound`.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<SentMessage>>,
    failing_channels: Mutex<HashMap<ChannelId, NotifyError>>,
    deleted: Mutex<HashSet<MessageHandle>>,
    next_id: AtomicU64,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `channel` fail with `error`.
    pub fn fail_channel(&self, channel: ChannelId, error: NotifyError) {
        self.failing_channels.lock().insert(channel, error);
    }

    /// Simulate the message being deleted by a user.
    pub fn delete_message(&self, handle: MessageHandle) {
        self.deleted.lock().insert(handle);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, channel: ChannelId) -> Vec<SentMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.handle.channel_id == channel)
            .cloned()
            .collect()
    }

    pub fn edits(&self) -> Vec<SentMessage> {
        self.edits.lock().clone()
    }
}

impl Notifier for MockNotifier {
    fn send<'a>(
        &'a self,
        channel: ChannelId,
        content: &'a MessageContent,
    ) -> BoxFuture<'a, NotifyResult<MessageHandle>> {
        Box::pin(async move {
            if let Some(error) = self.failing_channels.lock().get(&channel) {
                return Err(error.clone());
            }
            let handle = MessageHandle {
                channel_id: channel,
                message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            };
            self.sent.lock().push(SentMessage {
                handle,
                content: content.clone(),
            });
            Ok(handle)
        })
    }

    fn edit<'a>(
        &'a self,
        handle: &'a MessageHandle,
        content: &'a MessageContent,
    ) -> BoxFuture<'a, NotifyResult<()>> {
        Box::pin(async move {
            if self.deleted.lock().contains(handle) {
                return Err(NotifyError::NotFound(format!(
                    "message {}",
                    handle.message_id
                )));
            }
            if let Some(error) = self.failing_channels.lock().get(&handle.channel_id) {
                return Err(error.clone());
            }
            self.edits.lock().push(SentMessage {
                handle: *handle,
                content: content.clone(),
            });
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Embed;

    fn content() -> MessageContent {
        MessageContent {
            embed: Embed::new("Rank Update (na1)", 0),
            links: Vec::new(),
            toggle: None,
        }
    }

    #[tokio::test]
    async fn test_mock_records_and_fails_per_channel() {
        let mock = MockNotifier::new();
        mock.fail_channel(ChannelId(2), NotifyError::Forbidden("no access".to_string()));

        let handle = mock.send(ChannelId(1), &content()).await.unwrap();
        assert!(matches!(
            mock.send(ChannelId(2), &content()).await,
            Err(NotifyError::Forbidden(_))
        ));
        assert_eq!(mock.sent().len(), 1);
        assert_eq!(mock.sent_to(ChannelId(1))[0].handle, handle);
    }

    #[tokio::test]
    async fn test_mock_edit_of_deleted_message() {
        let mock = MockNotifier::new();
        let handle = mock.send(ChannelId(1), &content()).await.unwrap();
        mock.edit(&handle, &content()).await.unwrap();

        mock.delete_message(handle);
        let err = mock.edit(&handle, &content()).await.unwrap_err();
        assert!(err.is_gone());
        assert_eq!(mock.edits().len(), 1);
    }

    #[tokio::test]
    async fn test_log_notifier_assigns_ids() {
        let notifier = LogNotifier::new();
        let a = notifier.send(ChannelId(1), &content()).await.unwrap();
        let b = notifier.send(ChannelId(1), &content()).await.unwrap();
        assert_ne!(a.message_id, b.message_id);
        notifier.edit(&a, &content()).await.unwrap();
    }
}
