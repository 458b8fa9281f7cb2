//! Error types for job triggering.

use thiserror::Error;

/// Errors from starting a job.
#[derive(Error, Debug)]
pub enum JobError {
    /// The job service refused the request (unknown project, quota, ...).
    #[error("Job service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The job service could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// The job service answered with something we cannot read.
    #[error("Invalid response from job service: {0}")]
    InvalidResponse(String),

    /// The request could not be built.
    #[error("Invalid job request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for JobError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JobError::InvalidResponse(err.to_string())
        } else {
            JobError::Network(err.to_string())
        }
    }
}

/// Result type for job operations.
pub type JobResult<T> = std::result::Result<T, JobError>;
