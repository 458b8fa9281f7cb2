//! Job trigger trait and the HTTP job-service runner.
//!
//! The job service exposes one endpoint per project:
//!
//! ```text
//! POST {endpoint}/projects/{project}/builds
//! {"projectName": "...", "environmentVariablesOverride": [{"name", "value", "type"}]}
//!
//! 200 {"build": {"id": "...", "buildStatus": "IN_PROGRESS"}}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{JobError, JobResult};
use crate::request::{JobHandle, JobParameter, JobRequest};

/// Starts the job behind an action.
///
/// Implementations make exactly one attempt; retrying is the caller's call.
#[async_trait]
pub trait JobTrigger: Send + Sync {
    async fn start(&self, request: &JobRequest) -> JobResult<JobHandle>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartBuildRequest<'a> {
    project_name: &'a str,
    environment_variables_override: Vec<JobParameter>,
}

#[derive(Deserialize)]
struct StartBuildResponse {
    build: Build,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Build {
    id: String,
    #[serde(default)]
    build_status: Option<String>,
}

/// Runner that starts builds through the job service's HTTP API.
pub struct HttpJobRunner {
    client: reqwest::Client,
    endpoint: String,
    project_prefix: String,
    token: Option<SecretString>,
}

impl std::fmt::Debug for HttpJobRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpJobRunner")
            .field("endpoint", &self.endpoint)
            .field("project_prefix", &self.project_prefix)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpJobRunner {
    /// Create a runner. Projects are named `<project_prefix>-<action>`.
    pub fn new(
        endpoint: impl Into<String>,
        project_prefix: impl Into<String>,
        timeout: Duration,
    ) -> JobResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .map_err(|e| JobError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_prefix: project_prefix.into(),
            token: None,
        })
    }

    /// Authenticate with a bearer token.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Job service project for an action.
    pub fn project_name(&self, action: &str) -> String {
        format!("{}-{}", self.project_prefix, action)
    }
}

#[async_trait]
impl JobTrigger for HttpJobRunner {
    async fn start(&self, request: &JobRequest) -> JobResult<JobHandle> {
        let project = self.project_name(&request.action);
        let url = format!("{}/projects/{}/builds", self.endpoint, project);
        let body = StartBuildRequest {
            project_name: &project,
            environment_variables_override: request.parameters()?,
        };

        debug!(project = %project, user_id = %request.user_id, "Starting job");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(project = %project, status = %status, "Job service rejected the request");
            return Err(JobError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let reply: StartBuildResponse = response
            .json()
            .await
            .map_err(|e| JobError::InvalidResponse(e.to_string()))?;

        let handle = JobHandle {
            id: reply.build.id,
            status: reply
                .build
                .build_status
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            project,
        };
        info!(project = %handle.project, job_id = %handle.id, "Job started");
        Ok(handle)
    }
}
