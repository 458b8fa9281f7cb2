//! Application state shared across request handlers.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use secrecy::SecretString;
use senora_actions::ActionRegistry;
use senora_jobs::{HttpJobRunner, JobTrigger};
use senora_slack::{
    ClientOptions, CredentialSource, EnvCredentials, FileCredentials, Notifier, SlackApi,
    SlackClientCell, SlackResult,
};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::dialog::DialogController;
use crate::error::{AppError, AppResult};
use crate::metrics::{self, Metrics, MetricsSnapshot};

/// Everything a request handler needs.
///
/// The registry is read-only after start-up and the Slack client is built at
/// most once, so handlers share this without locks.
pub struct GatewayState {
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// Loaded actions.
    pub registry: Arc<ActionRegistry>,
    /// Starts jobs.
    pub jobs: Arc<dyn JobTrigger>,
    /// Lazily-built Slack session.
    pub slack: SlackClientCell,
    /// Dialog driver over `registry`.
    pub dialog: DialogController,
    /// Event counters.
    pub metrics: Arc<Metrics>,
    /// Work spawned after a request was acknowledged.
    tasks: TaskTracker,
    start_time: Instant,
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("config", &self.config)
            .field("actions", &self.registry.len())
            .field("slack_initialized", &self.slack.is_initialized())
            .field("pending_tasks", &self.tasks.len())
            .finish()
    }
}

impl GatewayState {
    /// Assemble state from already-built parts.
    pub fn new(
        config: GatewayConfig,
        registry: ActionRegistry,
        jobs: Arc<dyn JobTrigger>,
        slack: SlackClientCell,
    ) -> Self {
        let registry = Arc::new(registry);
        let metrics = Arc::new(Metrics::new());
        let dialog = DialogController::new(
            Arc::clone(&registry),
            Arc::clone(&metrics),
            config.app_title.clone(),
            config.command(),
        );

        Self {
            config,
            registry,
            jobs,
            slack,
            dialog,
            metrics,
            tasks: TaskTracker::new(),
            start_time: Instant::now(),
        }
    }

    /// Build state from configuration: load actions, set up the job runner
    /// and the (not yet initialized) Slack client.
    pub fn from_config(config: GatewayConfig) -> AppResult<Self> {
        let registry = ActionRegistry::load(&config.actions_dirs);

        let mut runner =
            HttpJobRunner::new(&config.job.endpoint, &config.bot_name, config.job.timeout())
                .map_err(|e| AppError::Configuration(e.to_string()))?;
        if let Some(token) = &config.job.token {
            runner = runner.with_token(SecretString::new(token.clone().into()));
        }

        let source: Arc<dyn CredentialSource> = match &config.slack.secret_file {
            Some(path) => Arc::new(FileCredentials::new(path)),
            None => Arc::new(EnvCredentials),
        };
        info!("Slack credentials will be read from {}", source.describe());

        let slack = SlackClientCell::new(
            source,
            ClientOptions {
                base_url: config.slack.api_base_url.clone(),
                ..Default::default()
            },
        );

        Ok(Self::new(config, registry, Arc::new(runner), slack))
    }

    /// The shared Slack session, built on first use.
    pub async fn slack_api(&self) -> SlackResult<Arc<dyn SlackApi>> {
        match self.slack.api().await {
            Ok(api) => Ok(api),
            Err(e) => {
                error!("Slack client unavailable: {}", e);
                self.metrics
                    .increment_counter(metrics::CREDENTIALS_ERROR)
                    .await;
                Err(e)
            }
        }
    }

    /// Notifier over the shared Slack session.
    pub async fn notifier(&self) -> SlackResult<Notifier> {
        Ok(Notifier::new(self.slack_api().await?))
    }

    /// Run post-acknowledgment work; shutdown waits for it.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Close the tracker and wait up to `timeout` for tracked work still
    /// running. Returns `false` if tasks were abandoned.
    pub async fn drain_tasks(&self, timeout: Duration) -> bool {
        self.tasks.close();
        if self.tasks.is_empty() {
            return true;
        }

        info!(pending = self.tasks.len(), "Waiting for background tasks");
        match tokio::time::timeout(timeout, self.tasks.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    pending = self.tasks.len(),
                    "Shutdown timeout reached, abandoning background tasks"
                );
                false
            }
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get metrics snapshot.
    pub async fn get_metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_seconds: self.uptime_secs(),
            counters: self.metrics.counters().await,
        }
    }
}
