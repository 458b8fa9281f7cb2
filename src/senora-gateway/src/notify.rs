//! Completion notifications.
//!
//! Invoked by whatever watches job completion, not by the dialog. The request
//! is validated before anything is sent: a missing field is a 400 and no
//! message goes out.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use senora_slack::Notifier;

use crate::metrics::{self, Metrics};

/// `notification_type` for a direct message.
pub const DIRECT_MESSAGE: &str = "direct-message";
/// `notification_type` for a thread reply.
pub const IN_THREAD: &str = "in-thread";

/// Inbound notification request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// `direct-message` (default) or `in-thread`.
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

/// A validated delivery target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    User(String),
    Thread { channel: String, thread_ts: String },
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl NotificationRequest {
    /// Check required fields. The error is the message returned to the caller.
    pub fn validate(&self) -> Result<(NotificationTarget, &str), String> {
        let message = present(&self.message).ok_or("Message is required")?;

        let kind = self.notification_type.as_deref().unwrap_or(DIRECT_MESSAGE);
        let target = match kind {
            DIRECT_MESSAGE => NotificationTarget::User(
                present(&self.user_id)
                    .ok_or("user_id is required for direct messages")?
                    .to_string(),
            ),
            IN_THREAD => match (present(&self.channel), present(&self.thread_ts)) {
                (Some(channel), Some(thread_ts)) => NotificationTarget::Thread {
                    channel: channel.to_string(),
                    thread_ts: thread_ts.to_string(),
                },
                _ => return Err("channel and thread_ts required for thread replies".to_string()),
            },
            other => return Err(format!("Invalid notification_type: {other}")),
        };

        Ok((target, message))
    }
}

/// Status plus JSON body.
#[derive(Debug, Clone)]
pub struct NotificationResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl NotificationResponse {
    fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message.into() }),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_error() -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to send notification")
    }
}

impl IntoResponse for NotificationResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Validate and deliver one notification.
pub async fn handle_notification(
    notifier: &Notifier,
    metrics: &Metrics,
    request: &NotificationRequest,
) -> NotificationResponse {
    let (target, message) = match request.validate() {
        Ok(valid) => valid,
        Err(reason) => {
            warn!("Rejected notification: {}", reason);
            return NotificationResponse::bad_request(reason);
        }
    };

    let (result, sent_counter) = match &target {
        NotificationTarget::User(user_id) => (
            notifier.send_to_user(user_id, message).await,
            metrics::DIRECT_MESSAGE_SENT,
        ),
        NotificationTarget::Thread { channel, thread_ts } => (
            notifier.send_to_thread(channel, thread_ts, message).await,
            metrics::THREAD_REPLY_SENT,
        ),
    };

    match result {
        Ok(delivery) => {
            info!(target = ?target, "Notification sent");
            metrics.increment_counter(sent_counter).await;
            NotificationResponse {
                status: StatusCode::OK,
                body: serde_json::json!({
                    "message": "Notification sent",
                    "response": delivery,
                }),
            }
        }
        Err(e) => {
            error!(target = ?target, "Error sending notification: {}", e);
            metrics.increment_counter(metrics::SLACK_API_ERROR).await;
            metrics.increment_counter(metrics::NOTIFICATION_ERROR).await;
            NotificationResponse::internal_error()
        }
    }
}
