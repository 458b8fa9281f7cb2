//! Slack slash command payloads and immediate responses.
//!
//! Slash commands arrive as `application/x-www-form-urlencoded` POSTs and must
//! be answered within 3 seconds; anything slower happens after the answer.

use serde::{Deserialize, Serialize};

/// Slack slash command payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    /// Command token (deprecated, use signing secret instead).
    #[serde(default)]
    pub token: String,
    /// Team ID.
    #[serde(default)]
    pub team_id: String,
    /// Team domain.
    #[serde(default)]
    pub team_domain: String,
    /// Channel ID where command was invoked.
    #[serde(default)]
    pub channel_id: String,
    /// Channel name.
    #[serde(default)]
    pub channel_name: String,
    /// User ID who invoked the command.
    pub user_id: String,
    /// Username.
    #[serde(default)]
    pub user_name: String,
    /// The command (e.g., "/senora").
    pub command: String,
    /// Text after the command.
    #[serde(default)]
    pub text: String,
    /// API app ID.
    #[serde(default)]
    pub api_app_id: String,
    /// URL for delayed responses.
    #[serde(default)]
    pub response_url: String,
    /// Trigger ID for opening modals.
    pub trigger_id: String,
}

impl SlashCommandPayload {
    /// Whether this payload is for `command`, compared case-insensitively.
    pub fn is_command(&self, command: &str) -> bool {
        self.command.trim().eq_ignore_ascii_case(command)
    }
}

/// Response type for slash command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Only visible to the user who invoked the command.
    #[default]
    Ephemeral,
    /// Visible to everyone in the channel.
    InChannel,
}

/// Immediate response to a slash command.
///
/// Must be sent within 3 seconds of receiving the command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlashCommandResponse {
    /// Response type (ephemeral or in_channel).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Simple text response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl SlashCommandResponse {
    /// Create a simple text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Set response type to ephemeral (only visible to invoker).
    pub fn ephemeral(mut self) -> Self {
        self.response_type = Some(ResponseType::Ephemeral);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_payload(command: &str, text: &str) -> SlashCommandPayload {
        SlashCommandPayload {
            token: "test-token".to_string(),
            team_id: "T12345".to_string(),
            team_domain: "test".to_string(),
            channel_id: "C67890".to_string(),
            channel_name: "general".to_string(),
            user_id: "U11111".to_string(),
            user_name: "testuser".to_string(),
            command: command.to_string(),
            text: text.to_string(),
            api_app_id: "A22222".to_string(),
            response_url: "https://hooks.slack.com/commands/xxx".to_string(),
            trigger_id: "trigger123".to_string(),
        }
    }

    #[test]
    fn test_is_command() {
        let payload = create_test_payload("/Senora", "");
        assert!(payload.is_command("/senora"));
        assert!(!payload.is_command("/other"));
    }

    #[test]
    fn test_deserialize_minimal_payload() {
        let payload: SlashCommandPayload = serde_json::from_value(serde_json::json!({
            "user_id": "U1",
            "command": "/senora",
            "trigger_id": "t-1"
        }))
        .unwrap();

        assert_eq!(payload.user_id, "U1");
        assert!(payload.text.is_empty());
        assert!(payload.response_url.is_empty());
    }

    #[test]
    fn test_slash_command_response() {
        let response = SlashCommandResponse::text("Hello!").ephemeral();
        assert_eq!(response.text, Some("Hello!".to_string()));
        assert_eq!(response.response_type, Some(ResponseType::Ephemeral));

        let value = serde_json::to_value(SlashCommandResponse::text("hi").ephemeral()).unwrap();
        assert_eq!(value["response_type"], "ephemeral");
    }
}
