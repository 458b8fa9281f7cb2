//! Gateway configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Bot name. Job projects are named `<bot_name>-<action>`.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Slash command that opens the dialog. Defaults to `/<bot_name>`.
    #[serde(default)]
    pub command: Option<String>,

    /// Title shown on the gateway's own modals.
    #[serde(default = "default_app_title")]
    pub app_title: String,

    /// Directories holding action definitions, scanned in order.
    #[serde(default = "default_actions_dirs")]
    pub actions_dirs: Vec<PathBuf>,

    /// Job service configuration.
    #[serde(default)]
    pub job: JobConfig,

    /// Slack configuration.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Seconds to wait at shutdown for work spawned after acknowledgments.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,

    /// Serve event counters on `GET /metrics`.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_bot_name() -> String {
    "senora".to_string()
}

fn default_app_title() -> String {
    "Senora Self-Service".to_string()
}

fn default_actions_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("actions")]
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            bot_name: default_bot_name(),
            command: None,
            app_title: default_app_title(),
            actions_dirs: default_actions_dirs(),
            job: JobConfig::default(),
            slack: SlackConfig::default(),
            max_body_size: default_max_body_size(),
            shutdown_timeout: default_shutdown_timeout(),
            metrics_enabled: true,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from defaults plus whatever `lookup` returns for the known keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("SENORA_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(name) = lookup("BOT_NAME").filter(|n| !n.trim().is_empty()) {
            config.bot_name = name.trim().to_string();
        }

        if let Some(command) = lookup("SENORA_COMMAND") {
            config.command = Some(command);
        }

        if let Some(dirs) = lookup("SENORA_ACTIONS_DIR") {
            config.actions_dirs = dirs
                .split(':')
                .filter(|d| !d.is_empty())
                .map(PathBuf::from)
                .collect();
        }

        if let Some(endpoint) = lookup("SENORA_JOB_ENDPOINT") {
            config.job.endpoint = endpoint;
        }

        if let Some(token) = lookup("SENORA_JOB_TOKEN") {
            config.job.token = Some(token);
        }

        if let Some(path) = lookup("SLACK_SECRET_FILE") {
            config.slack.secret_file = Some(PathBuf::from(path));
        }

        if let Some(url) = lookup("SLACK_API_BASE_URL") {
            config.slack.api_base_url = url;
        }

        if let Some(verify) = lookup("SENORA_VERIFY_SIGNATURES") {
            config.slack.verify_signatures = verify.parse().map_err(|_| {
                anyhow::anyhow!("SENORA_VERIFY_SIGNATURES must be true or false, got '{verify}'")
            })?;
        }

        if let Some(enabled) = lookup("SENORA_METRICS_ENABLED") {
            config.metrics_enabled = enabled.parse().map_err(|_| {
                anyhow::anyhow!("SENORA_METRICS_ENABLED must be true or false, got '{enabled}'")
            })?;
        }

        if let Some(timeout) = lookup("SENORA_SHUTDOWN_TIMEOUT") {
            config.shutdown_timeout = timeout.parse().map_err(|_| {
                anyhow::anyhow!("SENORA_SHUTDOWN_TIMEOUT must be a number of seconds, got '{timeout}'")
            })?;
        }

        Ok(config)
    }

    /// The slash command that opens the dialog.
    pub fn command(&self) -> String {
        match &self.command {
            Some(command) => command.clone(),
            None => format!("/{}", self.bot_name),
        }
    }
}

/// Job service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Base URL of the job service.
    #[serde(default = "default_job_endpoint")]
    pub endpoint: String,

    /// Bearer token for the job service.
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_job_timeout")]
    pub timeout_secs: u64,
}

fn default_job_endpoint() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_job_timeout() -> u64 {
    30
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            endpoint: default_job_endpoint(),
            token: None,
            timeout_secs: default_job_timeout(),
        }
    }
}

impl JobConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Slack configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// JSON secret document with `slack_bot_token` and `slack_signing_secret`.
    /// Credentials come from the environment when unset.
    #[serde(default)]
    pub secret_file: Option<PathBuf>,

    /// Web API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Verify `X-Slack-Signature` on inbound Slack requests.
    #[serde(default = "default_true")]
    pub verify_signatures: bool,
}

fn default_api_base_url() -> String {
    senora_slack::client::SLACK_API_BASE.to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            secret_file: None,
            api_base_url: default_api_base_url(),
            verify_signatures: true,
        }
    }
}
