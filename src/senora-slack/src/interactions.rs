//! Interactive component payloads (modal submissions).
//!
//! Slack POSTs these form-encoded with a single `payload` field holding JSON.
//! The raw JSON is kept alongside the typed view so it can be forwarded as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SlackError, SlackResult};
use crate::views::View;

/// Form body of an interaction request.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionForm {
    /// JSON-encoded interaction.
    pub payload: String,
}

/// The user who interacted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionUser {
    /// User ID.
    pub id: String,
    /// Handle.
    #[serde(default)]
    pub username: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

impl InteractionUser {
    /// Best available display name.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or_default()
    }
}

/// Submitted input state: `block_id -> action_id -> element state`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

impl ViewState {
    /// The value an element holds: a select's `selected_option.value` or a
    /// text input's `value`.
    pub fn value(&self, block_id: &str, action_id: &str) -> Option<&str> {
        let element = self.values.get(block_id)?.get(action_id)?;
        element
            .get("selected_option")
            .and_then(|o| o.get("value"))
            .or_else(|| element.get("value"))
            .and_then(|v| v.as_str())
    }
}

/// The view as Slack returns it in a submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmittedView {
    /// View ID.
    #[serde(default)]
    pub id: String,
    /// Callback id set when the view was opened.
    #[serde(default)]
    pub callback_id: String,
    /// Metadata set when the view was opened.
    #[serde(default)]
    pub private_metadata: String,
    /// Input state.
    #[serde(default)]
    pub state: ViewState,
}

/// A typed interaction plus its raw JSON.
#[derive(Debug, Clone)]
pub struct Interaction {
    /// `view_submission`, `block_actions`, `view_closed`, ...
    pub kind: String,
    /// Interacting user.
    pub user: InteractionUser,
    /// Trigger for follow-up modals.
    pub trigger_id: Option<String>,
    /// Submitted view, for view interactions.
    pub view: Option<SubmittedView>,
    /// The untouched payload.
    pub raw: serde_json::Value,
}

#[derive(Deserialize)]
struct InteractionFields {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    user: InteractionUser,
    #[serde(default)]
    trigger_id: Option<String>,
    #[serde(default)]
    view: Option<SubmittedView>,
}

impl Interaction {
    /// Parse the JSON carried in the `payload` form field.
    pub fn parse(payload: &str) -> SlackResult<Self> {
        let raw: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| SlackError::InvalidPayload(format!("Interaction is not JSON: {}", e)))?;
        let fields: InteractionFields = serde_json::from_value(raw.clone())
            .map_err(|e| SlackError::InvalidPayload(format!("Malformed interaction: {}", e)))?;

        Ok(Self {
            kind: fields.kind,
            user: fields.user,
            trigger_id: fields.trigger_id,
            view: fields.view,
            raw,
        })
    }

    /// Whether this is a modal submission.
    pub fn is_view_submission(&self) -> bool {
        self.kind == "view_submission"
    }
}

/// Synchronous answer to a `view_submission`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response_action", rename_all = "snake_case")]
pub enum ViewResponse {
    /// Show errors next to input blocks; the modal stays open.
    Errors { errors: BTreeMap<String, String> },
    /// Replace the current modal.
    Update { view: View },
}

impl ViewResponse {
    /// One error attached to one input block.
    pub fn field_error(block_id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(block_id.into(), message.into());
        Self::Errors { errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMISSION: &str = r#"{
        "type": "view_submission",
        "trigger_id": "123.456",
        "user": {"id": "U1", "username": "ada", "name": "ada.l", "team_id": "T1"},
        "view": {
            "id": "V1",
            "callback_id": "action_selection",
            "private_metadata": "",
            "state": {"values": {
                "action_select_block": {"action_select": {"type": "static_select", "selected_option": {"text": {"type": "plain_text", "text": "deploy"}, "value": "deploy"}}},
                "host_block": {"host": {"type": "plain_text_input", "value": "web-1"}}
            }}
        }
    }"#;

    #[test]
    fn test_parse_view_submission() {
        let interaction = Interaction::parse(SUBMISSION).unwrap();

        assert!(interaction.is_view_submission());
        assert_eq!(interaction.user.id, "U1");
        assert_eq!(interaction.user.display_name(), "ada.l");
        assert_eq!(interaction.trigger_id.as_deref(), Some("123.456"));

        let view = interaction.view.unwrap();
        assert_eq!(view.callback_id, "action_selection");
        assert_eq!(
            view.state.value("action_select_block", "action_select"),
            Some("deploy")
        );
        assert_eq!(view.state.value("host_block", "host"), Some("web-1"));
        assert_eq!(view.state.value("host_block", "missing"), None);
        assert_eq!(interaction.raw["user"]["team_id"], "T1");
    }

    #[test]
    fn test_display_name_fallback() {
        let user = InteractionUser {
            id: "U1".to_string(),
            username: Some("ada".to_string()),
            name: None,
        };
        assert_eq!(user.display_name(), "ada");
        assert_eq!(InteractionUser::default().display_name(), "");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Interaction::parse("{not json"),
            Err(SlackError::InvalidPayload(_))
        ));
        assert!(matches!(
            Interaction::parse(r#"{"user": {"id": "U1"}}"#),
            Err(SlackError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_view_response_serialization() {
        let value =
            serde_json::to_value(ViewResponse::field_error("block", "Invalid action selected"))
                .unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "response_action": "errors",
                "errors": {"block": "Invalid action selected"}
            })
        );

        let value = serde_json::to_value(ViewResponse::Update {
            view: View::modal("Next step"),
        })
        .unwrap();
        assert_eq!(value["response_action"], "update");
        assert_eq!(value["view"]["title"]["text"], "Next step");
    }
}
