//! Job triggering for the Senora gateway.
//!
//! Each action is backed by a job-service project named
//! `<bot_name>-<action>`. Starting a job passes the raw interaction payload
//! plus the invoking user's identity as plaintext parameters.

pub mod error;
pub mod request;
pub mod runner;

pub use error::{JobError, JobResult};
pub use request::{JobHandle, JobParameter, JobRequest};
pub use runner::{HttpJobRunner, JobTrigger};
