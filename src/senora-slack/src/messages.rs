//! Message and Block Kit types.
//!
//! Provides:
//! - Block Kit blocks and elements used by the gateway's views
//! - `chat.postMessage` content with thread support
//! - A small builder for block lists

use serde::{Deserialize, Serialize};

/// Slack Block Kit block types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    /// Header block.
    Header { text: SlackTextObject },
    /// Section block (main content).
    Section {
        text: SlackTextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<SlackTextObject>>,
    },
    /// Divider block.
    Divider {},
    /// Input block (modal forms).
    Input {
        block_id: String,
        label: SlackTextObject,
        element: SlackBlockElement,
        #[serde(skip_serializing_if = "Option::is_none")]
        optional: Option<bool>,
    },
}

impl SlackBlock {
    /// Convert the block into the raw JSON form views carry.
    pub fn into_value(self) -> serde_json::Value {
        serde_json::to_value(&self).unwrap_or_default()
    }
}

/// Slack text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackTextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<bool>,
}

impl SlackTextObject {
    /// Create a plain text object.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text".to_string(),
            text: text.into(),
            emoji: Some(true),
        }
    }

    /// Create a mrkdwn text object.
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
            emoji: None,
        }
    }
}

/// Interactive block elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlockElement {
    /// Single-choice dropdown.
    StaticSelect {
        action_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<SlackTextObject>,
        options: Vec<SlackOption>,
    },
}

/// An option of a select element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackOption {
    pub text: SlackTextObject,
    pub value: String,
}

impl SlackOption {
    /// Option whose label and value are the same string.
    pub fn labelled(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            text: SlackTextObject::plain(value.clone()),
            value,
        }
    }
}

/// Slack message content with blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackMessageContent {
    /// Fallback text for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Thread timestamp (for replies).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    /// Whether Slack should render the text as mrkdwn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mrkdwn: Option<bool>,
}

impl SlackMessageContent {
    /// Create a new message content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain mrkdwn text message.
    pub fn markdown(text: impl Into<String>) -> Self {
        Self::new().with_text(text).with_mrkdwn()
    }

    /// Set fallback text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set thread timestamp (for replies).
    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }

    /// Render text as mrkdwn.
    pub fn with_mrkdwn(mut self) -> Self {
        self.mrkdwn = Some(true);
        self
    }
}

/// Builder for block lists used in views.
#[derive(Debug, Default)]
pub struct SlackMessageBuilder {
    blocks: Vec<SlackBlock>,
}

impl SlackMessageBuilder {
    /// Create a new message builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header block.
    pub fn header(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Header {
            text: SlackTextObject::plain(text),
        });
        self
    }

    /// Add a section with mrkdwn text.
    pub fn section(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(SlackBlock::Section {
            text: SlackTextObject::mrkdwn(text),
            fields: None,
        });
        self
    }

    /// Add a divider.
    pub fn divider(mut self) -> Self {
        self.blocks.push(SlackBlock::Divider {});
        self
    }

    /// Take the accumulated blocks.
    pub fn into_blocks(self) -> Vec<SlackBlock> {
        self.blocks
    }
}
