//! Slack integration for the Senora gateway.
//!
//! This crate provides:
//! - Wire types for slash commands, interactive submissions and the Events API
//! - Block Kit blocks, messages and views (modals, home tab)
//! - A Web API client behind the [`SlackApi`] trait, built lazily by [`SlackClientCell`]
//! - The [`Notifier`] used for direct messages and thread replies
//! - `v0` request signature verification
//!
//! # Configuration
//!
//! Credentials come from a [`CredentialSource`]:
//! - `SLACK_BOT_TOKEN` - Bot OAuth token (xoxb-...)
//! - `SLACK_SIGNING_SECRET` - Signing secret for request verification
//!
//! or from a JSON secret document carrying `slack_bot_token` and
//! `slack_signing_secret`.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod interactions;
pub mod messages;
pub mod notifier;
pub mod signature;
pub mod views;

// Re-export main types
pub use client::{ClientOptions, Delivery, SlackApi, SlackClient, SlackClientCell, SlackSession};
pub use commands::{SlashCommandPayload, SlashCommandResponse};
pub use config::{CredentialSource, EnvCredentials, FileCredentials, SlackCredentials, StaticCredentials};
pub use error::{SlackError, SlackResult};
pub use events::{EventsApiRequest, SlackEvent};
pub use interactions::{Interaction, InteractionForm, ViewResponse};
pub use messages::{SlackBlock, SlackMessageBuilder, SlackMessageContent, SlackTextObject};
pub use notifier::Notifier;
pub use views::View;
