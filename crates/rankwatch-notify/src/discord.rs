//! Delivery through the chat platform's REST API.

use crate::config::NotifyConfig;
use crate::content::MessageContent;
use crate::error::{NotifyError, NotifyResult};
use crate::notifier::{MessageHandle, Notifier};
use rankwatch_core::{BoxFuture, ChannelId};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Custom id carried by the toggle button; interaction events use it to
/// route back to the registry.
pub const TOGGLE_CUSTOM_ID: &str = "rankwatch:toggle";

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;
const STYLE_SECONDARY: u8 = 2;
const STYLE_LINK: u8 = 5;

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    #[serde(default)]
    retry_after: f64,
}

/// REST notifier authenticated with a bot token.
pub struct DiscordNotifier {
    client: reqwest::Client,
    api_base: String,
}

impl DiscordNotifier {
    pub fn new(token: &str, config: &NotifyConfig) -> NotifyResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|e| NotifyError::HttpClient(format!("Invalid bot token: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| NotifyError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self, channel: ChannelId) -> String {
        format!("{}/channels/{}/messages", self.api_base, channel)
    }

    async fn read(response: reqwest::Response) -> NotifyResult<String> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Transport(format!("Failed to read body: {e}")))?;
        classify(status, &body)?;
        Ok(body)
    }
}

impl Notifier for DiscordNotifier {
    fn send<'a>(
        &'a self,
        channel: ChannelId,
        content: &'a MessageContent,
    ) -> BoxFuture<'a, NotifyResult<MessageHandle>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.messages_url(channel))
                .json(&payload(content))
                .send()
                .await
                .map_err(|e| NotifyError::Transport(format!("HTTP request failed: {e}")))?;
            let body = Self::read(response).await?;
            let created: CreatedMessage =
                serde_json::from_str(&body).map_err(|e| NotifyError::Decode(e.to_string()))?;
            let message_id = created
                .id
                .parse()
                .map_err(|_| NotifyError::Decode(format!("invalid message id: {}", created.id)))?;
            debug!(channel = %channel, message_id, "Message sent");
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
            let url = format!("{}/{}", self.messages_url(handle.channel_id), handle.message_id);
            let response = self
                .client
                .patch(url)
                .json(&payload(content))
                .send()
                .await
                .map_err(|e| NotifyError::Transport(format!("HTTP request failed: {e}")))?;
            Self::read(response).await?;
            Ok(())
        })
    }
}

/// Map a response status to a delivery outcome.
pub fn classify(status: u16, body: &str) -> NotifyResult<()> {
    match status {
        200..=299 => Ok(()),
        403 => Err(NotifyError::Forbidden(body.to_string())),
        404 => Err(NotifyError::NotFound(body.to_string())),
        429 => {
            let retry_after = serde_json::from_str::<RateLimitBody>(body)
                .map(|b| b.retry_after)
                .unwrap_or(0.0);
            warn!(retry_after, "Chat API rate limit hit");
            Err(NotifyError::RateLimited {
                retry_after_ms: (retry_after * 1000.0).max(0.0) as u64,
            })
        }
        _ => Err(NotifyError::Http {
            status,
            message: body.to_string(),
        }),
    }
}

/// JSON message body: one embed plus a single row of buttons.
pub fn payload(content: &MessageContent) -> Value {
    let mut buttons = Vec::new();
    if let Some(toggle) = &content.toggle {
        buttons.push(json!({
            "type": BUTTON,
            "style": STYLE_SECONDARY,
            "label": toggle.label,
            "custom_id": TOGGLE_CUSTOM_ID,
            "disabled": toggle.disabled,
        }));
    }
    for link in &content.links {
        buttons.push(json!({
            "type": BUTTON,
            "style": STYLE_LINK,
            "label": link.label,
            "url": link.url,
        }));
    }

    let components = if buttons.is_empty() {
        Vec::new()
    } else {
        vec![json!({ "type": ACTION_ROW, "components": buttons })]
    };

    json!({
        "embeds": [content.embed],
        "components": components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Embed, LinkButton, ToggleButton};

    fn content(toggle: Option<ToggleButton>) -> MessageContent {
        MessageContent {
            embed: Embed::new("Match Summary", 7).field("Blue Team", "a"),
            links: vec![LinkButton {
                label: "OP.GG".to_string(),
                url: "https://op.gg/x".to_string(),
            }],
            toggle,
        }
    }

    #[test]
    fn test_payload_shape() {
        let body = payload(&content(Some(ToggleButton {
            label: "Show Match Details".to_string(),
            disabled: true,
        })));

        assert_eq!(body["embeds"][0]["title"], "Match Summary");
        assert_eq!(body["embeds"][0]["color"], 7);
        assert_eq!(body["embeds"][0]["fields"][0]["inline"], false);
        assert!(body["embeds"][0].get("description").is_none());

        let row = &body["components"][0];
        assert_eq!(row["type"], 1);
        assert_eq!(row["components"][0]["custom_id"], TOGGLE_CUSTOM_ID);
        assert_eq!(row["components"][0]["disabled"], true);
        assert_eq!(row["components"][1]["style"], 5);
        assert_eq!(row["components"][1]["url"], "https://op.gg/x");
    }

    #[test]
    fn test_payload_without_buttons_has_no_rows() {
        let mut c = content(None);
        c.links.clear();
        let body = payload(&c);
        assert_eq!(body["components"], json!([]));
    }

    #[test]
    fn test_classify_statuses() {
        assert!(classify(200, "").is_ok());
        assert!(classify(204, "").is_ok());
        assert!(matches!(classify(404, "{}"), Err(NotifyError::NotFound(_))));
        assert!(matches!(classify(403, "{}"), Err(NotifyError::Forbidden(_))));
        assert!(matches!(
            classify(429, r#"{"retry_after": 1.5}"#),
            Err(NotifyError::RateLimited { retry_after_ms: 1500 })
        ));
        assert!(matches!(
            classify(500, "boom"),
            Err(NotifyError::Http { status: 500, .. })
        ));
    }

    #[test]
    fn test_new_rejects_invalid_token() {
        assert!(DiscordNotifier::new("bad\ntoken", &NotifyConfig::default()).is_err());
        assert!(DiscordNotifier::new("token", &NotifyConfig::default()).is_ok());
    }
}
