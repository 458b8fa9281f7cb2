//! Single-attempt message delivery to users and threads.

use std::sync::Arc;

use tracing::{debug, info};

use crate::client::{Delivery, SlackApi};
use crate::error::SlackResult;
use crate::messages::SlackMessageContent;

/// Sends plain mrkdwn messages through `chat.postMessage`.
///
/// There is no retry here: a rejected call is returned to the caller, which
/// decides whether the whole notification should be attempted again.
#[derive(Clone)]
pub struct Notifier {
    api: Arc<dyn SlackApi>,
}

impl Notifier {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    /// Direct message a user. Slack opens the DM conversation from the user ID.
    pub async fn send_to_user(&self, user_id: &str, message: &str) -> SlackResult<Delivery> {
        debug!(user_id = %user_id, "Sending direct message");
        let delivery = self
            .api
            .post_message(user_id, SlackMessageContent::markdown(message))
            .await?;
        info!(user_id = %user_id, ts = %delivery.ts, "Direct message sent");
        Ok(delivery)
    }

    /// Reply inside an existing thread.
    pub async fn send_to_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        message: &str,
    ) -> SlackResult<Delivery> {
        debug!(channel = %channel, thread_ts = %thread_ts, "Sending thread reply");
        let delivery = self
            .api
            .post_message(
                channel,
                SlackMessageContent::markdown(message).in_thread(thread_ts),
            )
            .await?;
        info!(channel = %channel, ts = %delivery.ts, "Thread reply sent");
        Ok(delivery)
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
