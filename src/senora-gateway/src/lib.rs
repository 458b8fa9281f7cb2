//! Senora gateway - Slack self-service automation.
//!
//! This crate provides:
//! - The slash command that opens the action selection modal
//! - The two-step modal dialog (selection, then the action's own form)
//! - Job triggering once the action's form is submitted
//! - A notification endpoint for job completion messages
//! - Informational replies to mentions, DMs and the home tab
//! - Event counters
//!
//! Routes:
//! - `POST /slack/commands`, `/slack/interactions`, `/slack/events` (signed by Slack)
//! - `POST /notify`
//! - `GET /health`
//! - `GET /metrics` (when `metrics_enabled`)

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod dialog;
pub mod error;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod notify;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::GatewayConfig;
pub use error::{AppError, AppResult};
pub use state::GatewayState;

/// Run the server with the given configuration.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    run_with_shutdown(config, std::future::pending()).await
}

/// Run the server with graceful shutdown support.
pub async fn run_with_shutdown<F>(config: GatewayConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    if !config.slack.verify_signatures {
        warn!("Slack request signature verification is disabled!");
        warn!("Anyone who can reach this server can trigger jobs.");
    }

    let addr: SocketAddr = config.listen_addr.parse()?;
    let state = Arc::new(GatewayState::from_config(config)?);

    if state.registry.is_empty() {
        warn!("No actions loaded; the selection modal will be empty");
    }

    let app = create_router(Arc::clone(&state));

    info!("Starting Senora gateway on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    let timeout = Duration::from_secs(state.config.shutdown_timeout);
    if state.drain_tasks(timeout).await {
        info!("Server shut down");
    } else {
        warn!("Server shut down with background work still running");
    }
    Ok(())
}

/// Create the application router.
pub fn create_router(state: Arc<GatewayState>) -> Router {
    let slack_routes = Router::new()
        .route("/slack/commands", post(handlers::slash_command))
        .route("/slack/interactions", post(handlers::interaction))
        .route("/slack/events", post(handlers::events))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::verify_slack_signature,
        ));

    let mut router = Router::new()
        .merge(slack_routes)
        .route("/notify", post(handlers::notify))
        .route("/health", get(handlers::health));

    if state.config.metrics_enabled {
        router = router.route("/metrics", get(handlers::get_metrics));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
