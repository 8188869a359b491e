//! Platform-neutral message content.

use serde::{Deserialize, Serialize};

pub const COLOUR_WIN: u32 = 0x2ecc71;
pub const COLOUR_LOSS: u32 = 0xe74c3c;
pub const COLOUR_NO_ACTIVITY: u32 = 0x95a5a6;
pub const COLOUR_SUMMARY: u32 = 0x9b59b6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }
}

/// External link rendered as a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

/// The expand / minimize toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleButton {
    pub label: String,
    pub disabled: bool,
}

/// Rendered notification: one embed plus its buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    pub embed: Embed,
    pub links: Vec<LinkButton>,
    /// `None` when there is nothing to expand.
    pub toggle: Option<ToggleButton>,
}

impl MessageContent {
    pub fn is_interactive(&self) -> bool {
        self.toggle.as_ref().is_some_and(|t| !t.disabled)
    }

    /// Same content with the toggle disabled. Links stay usable.
    pub fn deactivated(mut self) -> Self {
        if let Some(toggle) = self.toggle.as_mut() {
            toggle.disabled = true;
        }
        self
    }
}
