//! What gets sent to the job service and what comes back.

use serde::{Deserialize, Serialize};

use crate::error::{JobError, JobResult};

/// Parameter carrying the serialized interaction payload.
pub const PARAM_REQUEST_BODY: &str = "REQUEST_BODY";
/// Parameter carrying the Slack trigger id.
pub const PARAM_TRIGGER_ID: &str = "TRIGGER_ID";
/// Parameter carrying the invoking user's ID.
pub const PARAM_USER_ID: &str = "USER_ID";
/// Parameter carrying the invoking user's display name.
pub const PARAM_USER_NAME: &str = "USER_NAME";

/// A request to run the job behind an action.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Action name.
    pub action: String,
    /// The full interaction payload of the final submission.
    pub payload: serde_json::Value,
    /// Invoking user.
    pub user_id: String,
    /// Invoking user's display name.
    pub user_name: String,
    /// Trigger id of the submission, if Slack sent one.
    pub trigger_id: Option<String>,
}

impl JobRequest {
    /// Parameters handed to the job, so it can act without re-parsing the payload.
    pub fn parameters(&self) -> JobResult<Vec<JobParameter>> {
        let body = serde_json::to_string(&self.payload)
            .map_err(|e| JobError::InvalidRequest(e.to_string()))?;

        Ok(vec![
            JobParameter::plaintext(PARAM_REQUEST_BODY, body),
            JobParameter::plaintext(
                PARAM_TRIGGER_ID,
                self.trigger_id.clone().unwrap_or_default(),
            ),
            JobParameter::plaintext(PARAM_USER_ID, &self.user_id),
            JobParameter::plaintext(PARAM_USER_NAME, &self.user_name),
        ])
    }
}

/// One environment override for the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameter {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl JobParameter {
    pub fn plaintext(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: "PLAINTEXT".to_string(),
        }
    }
}

/// A started job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Build ID assigned by the job service.
    pub id: String,
    /// Status at start time (usually `IN_PROGRESS`).
    pub status: String,
    /// Project the build belongs to.
    pub project: String,
}
