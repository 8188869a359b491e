//! Notification rendering and delivery.
//!
//! - `render`: minimized and expanded views of a rank change
//! - `links`: third-party profile links per region
//! - `notifier`: the outbound `send` / `edit` seam and its implementations
//! - `dispatcher`: per-subscriber fan-out with send pacing
//! - `interactive`: toggle state and expiry of live notifications

pub mod config;
pub mod content;
pub mod discord;
pub mod dispatcher;
pub mod error;
pub mod interactive;
pub mod links;
pub mod notifier;
pub mod render;

pub use config::NotifyConfig;
pub use content::{Embed, EmbedField, LinkButton, MessageContent, ToggleButton};
pub use discord::DiscordNotifier;
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use error::{NotifyError, NotifyResult};
pub use interactive::{InteractiveNotification, NotificationRegistry, ToggleOutcome};
pub use links::{deeplol_link, opgg_link, profile_links};
pub use notifier::{LogNotifier, MessageHandle, MockNotifier, Notifier, SentMessage};
pub use render::{change_sentence, NotificationView};
