//! Replies to passive Slack events.
//!
//! These are informational only: a pointer to the slash command, and the home
//! tab listing what can be run.

use senora_actions::ActionRegistry;
use senora_slack::events::{AppHomeOpenedEvent, AppMentionEvent, MessageEvent, SlackEvent};
use senora_slack::{SlackApi, SlackMessageBuilder, SlackMessageContent, SlackResult, View};
use tracing::debug;

use crate::metrics::{self, Metrics};

/// Handle one parsed event.
pub async fn handle_event(
    api: &dyn SlackApi,
    registry: &ActionRegistry,
    metrics: &Metrics,
    command: &str,
    event: SlackEvent,
) -> SlackResult<()> {
    match event {
        SlackEvent::AppMention(mention) => {
            metrics.increment_counter(metrics::APP_MENTIONED).await;
            reply_to_mention(api, command, &mention).await
        }
        SlackEvent::Message(message) => {
            if !message.is_direct_message() || message.is_bot_message() {
                return Ok(());
            }
            metrics
                .increment_counter(metrics::DIRECT_MESSAGE_RECEIVED)
                .await;
            reply_to_direct_message(api, command, &message).await
        }
        SlackEvent::AppHomeOpened(opened) => {
            metrics.increment_counter(metrics::HOME_TAB_OPENED).await;
            publish_home(api, registry, command, &opened).await
        }
        SlackEvent::Unknown(kind) => {
            debug!("Ignoring event type: {}", kind);
            Ok(())
        }
    }
}

async fn reply_to_mention(
    api: &dyn SlackApi,
    command: &str,
    mention: &AppMentionEvent,
) -> SlackResult<()> {
    let text = format!(
        "Hi <@{}>! Use `{}` to see available actions.",
        mention.user, command
    );
    api.post_message(
        &mention.channel,
        SlackMessageContent::markdown(text).in_thread(mention.reply_thread()),
    )
    .await?;
    Ok(())
}

async fn reply_to_direct_message(
    api: &dyn SlackApi,
    command: &str,
    message: &MessageEvent,
) -> SlackResult<()> {
    let text = format!("Hello! Use `{}` to access self-service automation.", command);
    api.post_message(&message.channel, SlackMessageContent::markdown(text))
        .await?;
    Ok(())
}

async fn publish_home(
    api: &dyn SlackApi,
    registry: &ActionRegistry,
    command: &str,
    opened: &AppHomeOpenedEvent,
) -> SlackResult<()> {
    if opened.tab.as_deref().is_some_and(|tab| tab != "home") {
        return Ok(());
    }
    api.publish_view(&opened.user, &home_view(registry, command))
        .await
}

/// The home tab.
pub fn home_view(registry: &ActionRegistry, command: &str) -> View {
    let actions = if registry.is_empty() {
        "_No actions are configured._".to_string()
    } else {
        registry
            .names()
            .iter()
            .map(|name| format!("• `{}`", name))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let blocks = SlackMessageBuilder::new()
        .header("🤖 Senora Self-Service Bot")
        .section("Welcome! I can run self-service automation for you.")
        .divider()
        .section(format!(
            "*Getting started*\nType `{}` in any channel to pick an action and fill in its details.",
            command
        ))
        .section(format!("*Available actions ({})*\n{}", registry.len(), actions))
        .into_blocks();

    View::home().with_blocks(blocks)
}
