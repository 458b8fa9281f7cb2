//! Event counters.
//!
//! One counter per dialog step and notification outcome, exposed as a
//! snapshot on `GET /metrics`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tokio::sync::RwLock;

pub const SLASH_COMMAND_RECEIVED: &str = "slash_command_received";
pub const MODAL_OPENED: &str = "modal_opened";
pub const MODAL_OPEN_ERROR: &str = "modal_open_error";
pub const INITIAL_MODAL_SUBMITTED: &str = "initial_modal_submitted";
pub const ACTION_FORM_DISPLAYED: &str = "action_form_displayed";
pub const FINAL_MODAL_SUBMITTED: &str = "final_modal_submitted";
pub const ACTION_EXECUTED: &str = "action_executed";
pub const ACTION_EXECUTION_ERROR: &str = "action_execution_error";
pub const JOB_START_ERROR: &str = "job_start_error";
pub const APP_MENTIONED: &str = "app_mentioned";
pub const DIRECT_MESSAGE_RECEIVED: &str = "direct_message_received";
pub const HOME_TAB_OPENED: &str = "home_tab_opened";
pub const DIRECT_MESSAGE_SENT: &str = "direct_message_sent";
pub const THREAD_REPLY_SENT: &str = "thread_reply_sent";
pub const SLACK_API_ERROR: &str = "slack_api_error";
pub const NOTIFICATION_ERROR: &str = "notification_error";
pub const CREDENTIALS_ERROR: &str = "credentials_error";

/// Named monotonic counters.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: RwLock<HashMap<String, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter metric.
    pub async fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.write().await;
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Current value; zero if never incremented.
    pub async fn counter(&self, name: &str) -> u64 {
        *self.counters.read().await.get(name).unwrap_or(&0)
    }

    /// All counters, sorted by name.
    pub async fn counters(&self) -> BTreeMap<String, u64> {
        self.counters
            .read()
            .await
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }
}

/// Metrics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Server uptime in seconds.
    pub uptime_seconds: u64,
    /// Event counters.
    pub counters: BTreeMap<String, u64>,
}
