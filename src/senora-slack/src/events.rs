//! Events API payloads.
//!
//! Handles:
//! - `url_verification` - endpoint handshake
//! - `app_mention` - when the bot is @mentioned
//! - `message.im` - direct messages to the bot
//! - `app_home_opened` - user opened the bot's home tab

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SlackError, SlackResult};

/// Top-level body POSTed by the Events API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventsApiRequest {
    /// Endpoint verification handshake.
    UrlVerification { challenge: String },
    /// A wrapped event.
    EventCallback(EventPayload),
    /// Anything else (app_rate_limited, ...).
    #[serde(other)]
    Unknown,
}

/// Event callback payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    /// Team ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// API app ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_app_id: Option<String>,
    /// The actual event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<serde_json::Value>,
    /// Event ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Event time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<u64>,
}

/// Slack event types that we handle.
#[derive(Debug, Clone)]
pub enum SlackEvent {
    /// App mention event.
    AppMention(AppMentionEvent),
    /// Message event.
    Message(MessageEvent),
    /// Home tab opened.
    AppHomeOpened(AppHomeOpenedEvent),
    /// Unknown event type (for forward compatibility).
    Unknown(String),
}

/// Event payload for app mentions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMentionEvent {
    /// User who mentioned the bot.
    pub user: String,
    /// Text of the message (including the mention).
    #[serde(default)]
    pub text: String,
    /// Channel where the mention occurred.
    pub channel: String,
    /// Timestamp of the message.
    pub ts: String,
    /// Thread timestamp (if in a thread).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

impl AppMentionEvent {
    /// Thread to reply in: the existing thread, or a new one rooted at the mention.
    pub fn reply_thread(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

/// Event payload for messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    /// User who sent the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Text of the message.
    #[serde(default)]
    pub text: String,
    /// Channel where the message was sent.
    pub channel: String,
    /// Channel type (im, channel, group, mpim).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    /// Timestamp of the message.
    #[serde(default)]
    pub ts: String,
    /// Subtype of message (e.g., "bot_message").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Bot ID (if message is from a bot).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

impl MessageEvent {
    /// Check if this is a direct message.
    pub fn is_direct_message(&self) -> bool {
        self.channel_type.as_deref() == Some("im")
    }

    /// Check if this is a bot message (should be ignored).
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }
}

/// Event payload for the home tab being opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppHomeOpenedEvent {
    /// User who opened the tab.
    pub user: String,
    /// Which tab (`home` or `messages`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
}

/// Parse the inner event of an event callback.
pub fn parse_event(payload: &EventPayload) -> SlackResult<SlackEvent> {
    let event_json = payload
        .event
        .as_ref()
        .ok_or_else(|| SlackError::InvalidPayload("Missing event field".to_string()))?;

    let event_type = event_json
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("unknown");

    debug!("Parsing event type: {}", event_type);

    match event_type {
        "app_mention" => Ok(SlackEvent::AppMention(decode(event_type, event_json)?)),
        "message" => Ok(SlackEvent::Message(decode(event_type, event_json)?)),
        "app_home_opened" => Ok(SlackEvent::AppHomeOpened(decode(event_type, event_json)?)),
        other => Ok(SlackEvent::Unknown(other.to_string())),
    }
}

/// A malformed inbound event is the sender's problem, not an upstream failure.
fn decode<T: serde::de::DeserializeOwned>(
    event_type: &str,
    event_json: &serde_json::Value,
) -> SlackResult<T> {
    serde_json::from_value(event_json.clone())
        .map_err(|e| SlackError::InvalidPayload(format!("Malformed {event_type} event: {e}")))
}
