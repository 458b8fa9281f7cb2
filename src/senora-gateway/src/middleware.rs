//! HTTP middleware components.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use senora_slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER, verify_signature};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::state::GatewayState;

fn header<'a>(request: &'a Request, name: &str) -> AppResult<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Authentication(format!("Missing {name} header")))
}

/// Reject Slack requests whose `X-Slack-Signature` does not match the body.
///
/// The body is buffered to compute the signature and handed on unchanged.
/// Disabled when `slack.verify_signatures` is false.
pub async fn verify_slack_signature(
    State(state): State<Arc<GatewayState>>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    if !state.config.slack.verify_signatures {
        return Ok(next.run(request).await);
    }

    let timestamp = header(&request, TIMESTAMP_HEADER)?.to_string();
    let signature = header(&request, SIGNATURE_HEADER)?.to_string();

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, state.config.max_body_size)
        .await
        .map_err(|_| AppError::PayloadTooLarge)?;

    let session = state.slack.get().await?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();

    if let Err(e) = verify_signature(
        session.credentials.signing_secret(),
        &timestamp,
        &bytes,
        &signature,
        now,
    ) {
        warn!(uri = %parts.uri, "Rejected Slack request: {}", e);
        return Err(e.into());
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
