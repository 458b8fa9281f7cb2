//! Modal and home tab views.
//!
//! A [`View`] is the declarative description Slack renders. Known keys are
//! typed; anything else a template carries (e.g. `notify_on_close`,
//! `external_id`) is kept verbatim in `extra`.

use serde::{Deserialize, Serialize};

use crate::messages::{SlackBlock, SlackTextObject};

fn default_view_type() -> String {
    "modal".to_string()
}

/// A Slack view (modal or home tab).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// `modal` or `home`.
    #[serde(rename = "type", default = "default_view_type")]
    pub view_type: String,
    /// Identifies which handler receives the submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    /// Opaque string Slack hands back on submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_metadata: Option<String>,
    /// Modal title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<SlackTextObject>,
    /// Submit button label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<SlackTextObject>,
    /// Close button label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<SlackTextObject>,
    /// Raw Block Kit blocks.
    #[serde(default)]
    pub blocks: Vec<serde_json::Value>,
    /// Other view keys.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl View {
    /// Empty modal with a title.
    pub fn modal(title: impl Into<String>) -> Self {
        Self {
            view_type: default_view_type(),
            callback_id: None,
            private_metadata: None,
            title: Some(SlackTextObject::plain(title)),
            submit: None,
            close: None,
            blocks: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Empty home tab.
    pub fn home() -> Self {
        Self {
            view_type: "home".to_string(),
            title: None,
            ..Self::modal("")
        }
    }

    /// Set the callback id.
    pub fn with_callback_id(mut self, callback_id: impl Into<String>) -> Self {
        self.callback_id = Some(callback_id.into());
        self
    }

    /// Set the private metadata.
    pub fn with_private_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.private_metadata = Some(metadata.into());
        self
    }

    /// Set the submit button label.
    pub fn with_submit(mut self, label: impl Into<String>) -> Self {
        self.submit = Some(SlackTextObject::plain(label));
        self
    }

    /// Set the close button label.
    pub fn with_close(mut self, label: impl Into<String>) -> Self {
        self.close = Some(SlackTextObject::plain(label));
        self
    }

    /// Append a typed block.
    pub fn with_block(mut self, block: SlackBlock) -> Self {
        self.blocks.push(block.into_value());
        self
    }

    /// Append typed blocks.
    pub fn with_blocks(mut self, blocks: impl IntoIterator<Item = SlackBlock>) -> Self {
        self.blocks
            .extend(blocks.into_iter().map(SlackBlock::into_value));
        self
    }

    /// Title text, if any.
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_ref().map(|t| t.text.as_str())
    }
}
