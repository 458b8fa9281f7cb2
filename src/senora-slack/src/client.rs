//! Slack Web API client.
//!
//! [`SlackClient`] wraps the handful of Web API methods the gateway calls.
//! [`SlackClientCell`] builds it lazily: credentials are fetched on first use,
//! exactly once, and the client is shared for the rest of the process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::{CredentialSource, SlackCredentials};
use crate::error::{SlackApiError, SlackError, SlackResult};
use crate::messages::SlackMessageContent;
use crate::views::View;

/// Default Web API base URL.
pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Where a posted message landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Channel (or DM conversation) ID.
    pub channel: String,
    /// Message timestamp.
    pub ts: String,
}

/// The Web API surface the gateway depends on.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `chat.postMessage`.
    async fn post_message(
        &self,
        channel: &str,
        content: SlackMessageContent,
    ) -> SlackResult<Delivery>;

    /// `views.open`.
    async fn open_view(&self, trigger_id: &str, view: &View) -> SlackResult<()>;

    /// `views.publish`.
    async fn publish_view(&self, user_id: &str, view: &View) -> SlackResult<()>;
}

/// Client tuning.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Web API base URL.
    pub base_url: String,
    /// Timeout for API requests.
    pub api_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: SLACK_API_BASE.to_string(),
            api_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the Slack Web API.
pub struct SlackClient {
    credentials: SlackCredentials,
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SlackClient {
    /// Create a client with default options.
    pub fn new(credentials: SlackCredentials) -> SlackResult<Self> {
        Self::with_options(credentials, ClientOptions::default())
    }

    /// Create a client with custom options.
    pub fn with_options(credentials: SlackCredentials, options: ClientOptions) -> SlackResult<Self> {
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .timeout(options.api_timeout)
            .build()
            .map_err(|e| SlackError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Make an API call to Slack and check the `ok` flag.
    async fn api_call(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> SlackResult<serde_json::Value> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.bot_token()),
            )
            .header("Content-Type", "application/json; charset=utf-8")
            .json(payload)
            .send()
            .await?;

        if response.status() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            return Err(SlackError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{}: {}", status, body)));
        }

        let json: serde_json::Value = response.json().await?;
        if json.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            return Err(SlackApiError::from_response(method, &json).into());
        }

        Ok(json)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn post_message(
        &self,
        channel: &str,
        content: SlackMessageContent,
    ) -> SlackResult<Delivery> {
        let mut payload = serde_json::to_value(&content)?;
        payload["channel"] = serde_json::json!(channel);

        let response = self.api_call("chat.postMessage", &payload).await?;

        let ts = response
            .get("ts")
            .and_then(|ts| ts.as_str())
            .ok_or_else(|| SlackError::Api("Missing ts in response".to_string()))?;
        let channel = response
            .get("channel")
            .and_then(|c| c.as_str())
            .unwrap_or(channel);

        debug!(channel = %channel, ts = %ts, "Message posted");
        Ok(Delivery {
            channel: channel.to_string(),
            ts: ts.to_string(),
        })
    }

    async fn open_view(&self, trigger_id: &str, view: &View) -> SlackResult<()> {
        let payload = serde_json::json!({
            "trigger_id": trigger_id,
            "view": view,
        });
        self.api_call("views.open", &payload).await?;
        Ok(())
    }

    async fn publish_view(&self, user_id: &str, view: &View) -> SlackResult<()> {
        let payload = serde_json::json!({
            "user_id": user_id,
            "view": view,
        });
        self.api_call("views.publish", &payload).await?;
        Ok(())
    }
}

/// An initialized Slack connection: the API plus the credentials behind it.
#[derive(Clone)]
pub struct SlackSession {
    /// Web API.
    pub api: Arc<dyn SlackApi>,
    /// Credentials (the signing secret is needed for request verification).
    pub credentials: SlackCredentials,
}

impl std::fmt::Debug for SlackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackSession")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Lazily-initialized, process-wide Slack session.
///
/// The first caller fetches credentials and builds the client; concurrent
/// callers wait for that same initialization. A failed initialization is not
/// cached, so the next request tries again.
pub struct SlackClientCell {
    source: Arc<dyn CredentialSource>,
    options: ClientOptions,
    session: OnceCell<SlackSession>,
}

impl SlackClientCell {
    /// Cell that initializes from `source` on first use.
    pub fn new(source: Arc<dyn CredentialSource>, options: ClientOptions) -> Self {
        Self {
            source,
            options,
            session: OnceCell::new(),
        }
    }

    /// Cell that is already initialized with the given API.
    pub fn ready(api: Arc<dyn SlackApi>, credentials: SlackCredentials) -> Self {
        Self {
            source: Arc::new(crate::config::StaticCredentials(credentials.clone())),
            options: ClientOptions::default(),
            session: OnceCell::new_with(Some(SlackSession { api, credentials })),
        }
    }

    /// Whether the session has been built.
    pub fn is_initialized(&self) -> bool {
        self.session.initialized()
    }

    /// Get the session, building it on first call.
    pub async fn get(&self) -> SlackResult<SlackSession> {
        let session = self
            .session
            .get_or_try_init(|| async {
                info!("Initializing Slack client from {}", self.source.describe());
                let credentials = self.source.fetch().await?;
                let client = SlackClient::with_options(credentials.clone(), self.options.clone())?;
                Ok::<_, SlackError>(SlackSession {
                    api: Arc::new(client),
                    credentials,
                })
            })
            .await?;
        Ok(session.clone())
    }

    /// Shortcut for the API half of the session.
    pub async fn api(&self) -> SlackResult<Arc<dyn SlackApi>> {
        Ok(self.get().await?.api)
    }
}
