//! HTTP request handlers.
//!
//! Slack expects an answer within 3 seconds, so anything that calls out
//! (opening a modal, starting a job, posting messages) is spawned after the
//! acknowledgment is built. That work is best-effort; its failures are logged.
//! Spawned work goes through [`GatewayState::spawn`] so shutdown can wait on it.

use std::sync::Arc;

use axum::Form;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, info, warn};

use senora_slack::events::parse_event;
use senora_slack::{EventsApiRequest, Interaction, InteractionForm, SlashCommandPayload, SlashCommandResponse};

use crate::dialog::DialogStep;
use crate::error::AppResult;
use crate::events::handle_event;
use crate::metrics::{self, MetricsSnapshot};
use crate::notify::{NotificationRequest, NotificationResponse, handle_notification};
use crate::state::GatewayState;

/// `POST /slack/commands`
pub async fn slash_command(
    State(state): State<Arc<GatewayState>>,
    Form(payload): Form<SlashCommandPayload>,
) -> Response {
    let command = state.config.command();
    if !payload.is_command(&command) {
        warn!(command = %payload.command, "Unknown slash command");
        return Json(
            SlashCommandResponse::text(format!("Unknown command: {}", payload.command))
                .ephemeral(),
        )
        .into_response();
    }

    info!(user_id = %payload.user_id, "Opening action selection");
    state
        .metrics
        .increment_counter(metrics::SLASH_COMMAND_RECEIVED)
        .await;

    let task_state = Arc::clone(&state);
    state.spawn(async move {
        let Ok(api) = task_state.slack_api().await else {
            task_state
                .metrics
                .increment_counter(metrics::MODAL_OPEN_ERROR)
                .await;
            return;
        };
        // open_selection logs and notifies on its own
        let _ = task_state
            .dialog
            .open_selection(api, &payload.trigger_id, &payload.user_id)
            .await;
    });

    StatusCode::OK.into_response()
}

/// `POST /slack/interactions`
pub async fn interaction(
    State(state): State<Arc<GatewayState>>,
    Form(form): Form<InteractionForm>,
) -> AppResult<Response> {
    let interaction = Interaction::parse(&form.payload)?;

    if !interaction.is_view_submission() {
        debug!(kind = %interaction.kind, "Ignoring interaction");
        return Ok(StatusCode::OK.into_response());
    }

    let step = state.dialog.on_view_submission(&interaction);
    state.dialog.record_submission(&interaction, &step).await;
    let response = step.view_response();

    if let DialogStep::Accept(request) = step {
        let task_state = Arc::clone(&state);
        state.spawn(async move {
            // The modal is already closed: start the job even if the user
            // cannot be messaged.
            let notifier = task_state.notifier().await.ok();
            task_state
                .dialog
                .complete(notifier.as_ref(), task_state.jobs.as_ref(), request)
                .await;
        });
    }

    Ok(match response {
        Some(body) => Json(body).into_response(),
        None => StatusCode::OK.into_response(),
    })
}

/// `POST /slack/events`
pub async fn events(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<EventsApiRequest>,
) -> Response {
    let payload = match request {
        EventsApiRequest::UrlVerification { challenge } => {
            return Json(serde_json::json!({ "challenge": challenge })).into_response();
        }
        EventsApiRequest::EventCallback(payload) => payload,
        EventsApiRequest::Unknown => return StatusCode::OK.into_response(),
    };

    // Passive events are informational; a payload we cannot read is logged
    // and acknowledged so Slack does not redeliver it.
    let event = match parse_event(&payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(event_id = ?payload.event_id, "Ignoring unreadable event: {}", e);
            return StatusCode::OK.into_response();
        }
    };

    let task_state = Arc::clone(&state);
    state.spawn(async move {
        let result = match task_state.slack_api().await {
            Ok(api) => {
                handle_event(
                    api.as_ref(),
                    &task_state.registry,
                    &task_state.metrics,
                    &task_state.config.command(),
                    event,
                )
                .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Failed to handle event: {}", e);
        }
    });

    StatusCode::OK.into_response()
}

/// `POST /notify`
pub async fn notify(State(state): State<Arc<GatewayState>>, body: Bytes) -> NotificationResponse {
    let request: NotificationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid notification body: {}", e);
            return NotificationResponse::bad_request("Invalid JSON body");
        }
    };

    // Validate before touching Slack so bad requests never need credentials.
    if let Err(reason) = request.validate() {
        warn!("Rejected notification: {}", reason);
        return NotificationResponse::bad_request(reason);
    }

    let Ok(notifier) = state.notifier().await else {
        state
            .metrics
            .increment_counter(metrics::NOTIFICATION_ERROR)
            .await;
        return NotificationResponse::internal_error();
    };

    handle_notification(&notifier, &state.metrics, &request).await
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub actions: usize,
    pub uptime_secs: u64,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        actions: state.registry.len(),
        uptime_secs: state.uptime_secs(),
    })
}

/// `GET /metrics`
pub async fn get_metrics(State(state): State<Arc<GatewayState>>) -> Json<MetricsSnapshot> {
    Json(state.get_metrics().await)
}
