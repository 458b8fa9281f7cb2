//! Slack credentials and where they come from.
//!
//! Credentials are loaded from one of:
//! - Environment variables (`SLACK_BOT_TOKEN`, `SLACK_SIGNING_SECRET`)
//! - A JSON secret document with `slack_bot_token` and `slack_signing_secret`
//! - A value supplied directly by the embedding program

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{SlackError, SlackResult};

/// Environment variable holding the bot token.
pub const ENV_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";
/// Environment variable holding the signing secret.
pub const ENV_SIGNING_SECRET: &str = "SLACK_SIGNING_SECRET";

/// Keys a secret document must carry.
const REQUIRED_SECRET_KEYS: &[&str] = &["slack_bot_token", "slack_signing_secret"];

/// Credentials needed to talk to Slack and to verify its requests.
#[derive(Clone)]
pub struct SlackCredentials {
    /// Bot OAuth token (xoxb-...).
    bot_token: SecretString,
    /// Signing secret for request verification.
    signing_secret: SecretString,
}

impl std::fmt::Debug for SlackCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackCredentials")
            .field("bot_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .finish()
    }
}

impl SlackCredentials {
    /// Create credentials from raw values.
    pub fn new(bot_token: impl Into<String>, signing_secret: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::new(bot_token.into().into()),
            signing_secret: SecretString::new(signing_secret.into().into()),
        }
    }

    /// Get the bot token.
    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    /// Get the signing secret.
    pub fn signing_secret(&self) -> &str {
        self.signing_secret.expose_secret()
    }

    /// Validate the credentials.
    pub fn validate(&self) -> SlackResult<()> {
        if self.bot_token.expose_secret().is_empty() {
            return Err(SlackError::Credentials("Bot token is empty".to_string()));
        }
        if self.signing_secret.expose_secret().is_empty() {
            return Err(SlackError::Credentials(
                "Signing secret is empty".to_string(),
            ));
        }
        if !self.bot_token.expose_secret().starts_with("xoxb-") {
            warn!("Bot token doesn't start with 'xoxb-', this may be incorrect");
        }
        Ok(())
    }

    /// Read credentials through a key lookup function.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SlackResult<Self> {
        let bot_token = lookup(ENV_BOT_TOKEN)
            .ok_or_else(|| SlackError::Credentials(format!("{} not set", ENV_BOT_TOKEN)))?;
        let signing_secret = lookup(ENV_SIGNING_SECRET)
            .ok_or_else(|| SlackError::Credentials(format!("{} not set", ENV_SIGNING_SECRET)))?;

        let credentials = Self::new(bot_token, signing_secret);
        credentials.validate()?;
        Ok(credentials)
    }

    /// Parse a JSON secret document.
    pub fn from_secret_json(document: &str) -> SlackResult<Self> {
        let value: serde_json::Value = serde_json::from_str(document)
            .map_err(|e| SlackError::Credentials(format!("Secret is not valid JSON: {}", e)))?;

        let missing: Vec<&str> = REQUIRED_SECRET_KEYS
            .iter()
            .copied()
            .filter(|key| value.get(*key).and_then(|v| v.as_str()).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(SlackError::Credentials(format!(
                "Secret missing keys: {}",
                missing.join(", ")
            )));
        }

        let secret: SecretDocument = serde_json::from_value(value)?;
        let credentials = Self::new(secret.slack_bot_token, secret.slack_signing_secret);
        credentials.validate()?;
        Ok(credentials)
    }
}

#[derive(Deserialize)]
struct SecretDocument {
    slack_bot_token: String,
    slack_signing_secret: String,
}

/// A place Slack credentials can be fetched from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch the credentials. Called at most once per process by
    /// [`SlackClientCell`](crate::client::SlackClientCell).
    async fn fetch(&self) -> SlackResult<SlackCredentials>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}

/// Credentials from `SLACK_BOT_TOKEN` / `SLACK_SIGNING_SECRET`.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

#[async_trait]
impl CredentialSource for EnvCredentials {
    async fn fetch(&self) -> SlackResult<SlackCredentials> {
        debug!("Loading Slack credentials from environment");
        SlackCredentials::from_lookup(|key| std::env::var(key).ok())
    }

    fn describe(&self) -> String {
        "environment".to_string()
    }
}

/// Credentials from a JSON secret document on disk.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    /// Read credentials from the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the secret document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialSource for FileCredentials {
    async fn fetch(&self) -> SlackResult<SlackCredentials> {
        debug!("Loading Slack credentials from {}", self.path.display());
        let document = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SlackError::Credentials(format!(
                "Failed to read secret {}: {}",
                self.path.display(),
                e
            ))
        })?;
        SlackCredentials::from_secret_json(&document)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Credentials supplied directly by the caller.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub SlackCredentials);

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn fetch(&self) -> SlackResult<SlackCredentials> {
        self.0.validate()?;
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
