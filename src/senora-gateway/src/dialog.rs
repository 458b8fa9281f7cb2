//! The two-step action dialog.
//!
//! ```text
//! /senora ──► selection modal ──submit──► action modal ──submit──► job started
//!             (action_selection)          (action_submission,
//!                                          private_metadata = token)
//! ```
//!
//! No session state is kept server-side. The chosen action travels with the
//! replacement modal as a [`CorrelationToken`] in `private_metadata`, and is
//! checked against the registry again when the final form comes back.

use std::sync::Arc;

use senora_actions::ActionRegistry;
use senora_jobs::{JobHandle, JobRequest, JobTrigger};
use senora_slack::interactions::{Interaction, SubmittedView};
use senora_slack::messages::{SlackBlockElement, SlackOption};
use senora_slack::{Notifier, SlackApi, SlackBlock, SlackResult, SlackTextObject, View, ViewResponse};
use tracing::{debug, error, info, warn};

use crate::metrics::{self, Metrics};

/// Callback id of the selection modal.
pub const SELECTION_CALLBACK_ID: &str = "action_selection";
/// Callback id of an action's parameter modal.
pub const SUBMISSION_CALLBACK_ID: &str = "action_submission";
/// Block holding the action dropdown.
pub const ACTION_SELECT_BLOCK: &str = "action_select_block";
/// The action dropdown.
pub const ACTION_SELECT: &str = "action_select";

const INVALID_SELECTION: &str = "Invalid action selected";
const OPEN_FAILED: &str = "❌ Sorry, I encountered an error. Please try again later.";

/// The chosen action, carried between the two steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(action: impl Into<String>) -> Self {
        Self(action.into())
    }

    /// Read a token back from `private_metadata`. Exact inverse of
    /// [`encode`](Self::encode); empty metadata carries no token.
    pub fn decode(metadata: &str) -> Option<Self> {
        if metadata.is_empty() {
            None
        } else {
            Some(Self(metadata.to_string()))
        }
    }

    /// Value written to `private_metadata`.
    pub fn encode(&self) -> String {
        self.0.clone()
    }

    pub fn action(&self) -> &str {
        &self.0
    }
}

/// Where a submitted view sits in the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogStage {
    AwaitingSelection,
    /// The token is `None` when the metadata was empty or missing.
    AwaitingSubmission(Option<CorrelationToken>),
}

impl DialogStage {
    /// Identify the stage from a submitted view's callback id.
    pub fn of(view: &SubmittedView) -> Option<Self> {
        match view.callback_id.as_str() {
            SELECTION_CALLBACK_ID => Some(Self::AwaitingSelection),
            SUBMISSION_CALLBACK_ID => Some(Self::AwaitingSubmission(CorrelationToken::decode(
                &view.private_metadata,
            ))),
            _ => None,
        }
    }
}

/// What to do with a view submission.
#[derive(Debug, Clone)]
pub enum DialogStep {
    /// Keep the modal open with an error on one input block.
    Reject { block_id: String, message: String },
    /// Swap in the next modal.
    Replace(View),
    /// Replace the modal with an error screen; the session ends.
    Fail(View),
    /// Close the modal and start the job.
    Accept(JobRequest),
    /// Not ours; acknowledge and do nothing.
    Ignore,
}

impl DialogStep {
    /// Synchronous answer to Slack. `None` means an empty acknowledgment,
    /// which closes the modal.
    pub fn view_response(&self) -> Option<ViewResponse> {
        match self {
            Self::Reject { block_id, message } => {
                Some(ViewResponse::field_error(block_id.clone(), message.clone()))
            }
            Self::Replace(view) | Self::Fail(view) => Some(ViewResponse::Update { view: view.clone() }),
            Self::Accept(_) | Self::Ignore => None,
        }
    }
}

/// Drives the selection and submission steps.
#[derive(Debug, Clone)]
pub struct DialogController {
    registry: Arc<ActionRegistry>,
    metrics: Arc<Metrics>,
    app_title: String,
    command: String,
}

impl DialogController {
    pub fn new(
        registry: Arc<ActionRegistry>,
        metrics: Arc<Metrics>,
        app_title: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            metrics,
            app_title: app_title.into(),
            command: command.into(),
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// The selection modal: one option per registered action, sorted by name.
    pub fn selection_view(&self) -> View {
        let view = View::modal(&self.app_title)
            .with_callback_id(SELECTION_CALLBACK_ID)
            .with_close("Cancel");

        if self.registry.is_empty() {
            // A static_select without options is rejected by Slack.
            return view.with_block(SlackBlock::Section {
                text: SlackTextObject::mrkdwn("No actions are available right now."),
                fields: None,
            });
        }

        let options = self
            .registry
            .names()
            .into_iter()
            .map(SlackOption::labelled)
            .collect();

        view.with_submit("Next").with_blocks([
            SlackBlock::Section {
                text: SlackTextObject::mrkdwn("Select an action to perform:"),
                fields: None,
            },
            SlackBlock::Input {
                block_id: ACTION_SELECT_BLOCK.to_string(),
                label: SlackTextObject::plain("Action"),
                element: SlackBlockElement::StaticSelect {
                    action_id: ACTION_SELECT.to_string(),
                    placeholder: Some(SlackTextObject::plain("Choose an action...")),
                    options,
                },
                optional: None,
            },
        ])
    }

    /// Decide what a `view_submission` leads to.
    pub fn on_view_submission(&self, interaction: &Interaction) -> DialogStep {
        let Some(view) = interaction.view.as_ref() else {
            return DialogStep::Ignore;
        };

        match DialogStage::of(view) {
            Some(DialogStage::AwaitingSelection) => self.on_selection(view),
            Some(DialogStage::AwaitingSubmission(token)) => self.on_submission(interaction, token),
            None => {
                debug!(callback_id = %view.callback_id, "Ignoring view submission");
                DialogStep::Ignore
            }
        }
    }

    /// Count a submission and the step it led to.
    pub async fn record_submission(&self, interaction: &Interaction, step: &DialogStep) {
        match interaction.view.as_ref().and_then(DialogStage::of) {
            Some(DialogStage::AwaitingSelection) => {
                self.metrics
                    .increment_counter(metrics::INITIAL_MODAL_SUBMITTED)
                    .await;
                if matches!(step, DialogStep::Replace(_)) {
                    self.metrics
                        .increment_counter(metrics::ACTION_FORM_DISPLAYED)
                        .await;
                }
            }
            Some(DialogStage::AwaitingSubmission(_)) => {
                self.metrics
                    .increment_counter(metrics::FINAL_MODAL_SUBMITTED)
                    .await;
            }
            None => {}
        }
    }

    fn on_selection(&self, view: &SubmittedView) -> DialogStep {
        let selected = view.state.value(ACTION_SELECT_BLOCK, ACTION_SELECT);

        let Some(template) = selected.and_then(|name| self.registry.get(name)) else {
            warn!(selected = ?selected, "Invalid action selected");
            return DialogStep::Reject {
                block_id: ACTION_SELECT_BLOCK.to_string(),
                message: INVALID_SELECTION.to_string(),
            };
        };

        let token = CorrelationToken::new(template.name());
        info!(action = %token.action(), "Action selected");

        DialogStep::Replace(
            template
                .view()
                .clone()
                .with_callback_id(SUBMISSION_CALLBACK_ID)
                .with_private_metadata(token.encode()),
        )
    }

    fn on_submission(
        &self,
        interaction: &Interaction,
        token: Option<CorrelationToken>,
    ) -> DialogStep {
        let Some(token) = token.filter(|t| self.registry.contains(t.action())) else {
            error!("Submission references an action that is not registered");
            return DialogStep::Fail(self.unavailable_view());
        };

        info!(action = %token.action(), user_id = %interaction.user.id, "Action submitted");

        DialogStep::Accept(JobRequest {
            action: token.action().to_string(),
            payload: interaction.raw.clone(),
            user_id: interaction.user.id.clone(),
            user_name: interaction.user.display_name().to_string(),
            trigger_id: interaction.trigger_id.clone(),
        })
    }

    fn unavailable_view(&self) -> View {
        View::modal(&self.app_title)
            .with_close("Close")
            .with_block(SlackBlock::Section {
                text: SlackTextObject::mrkdwn(format!(
                    "⚠️ This action is no longer available. Please start again with `{}`.",
                    self.command
                )),
                fields: None,
            })
    }

    /// Open the selection modal. On failure the user gets a short DM.
    pub async fn open_selection(
        &self,
        api: Arc<dyn SlackApi>,
        trigger_id: &str,
        user_id: &str,
    ) -> SlackResult<()> {
        match api.open_view(trigger_id, &self.selection_view()).await {
            Ok(()) => {
                debug!(user_id = %user_id, "Selection modal opened");
                self.metrics.increment_counter(metrics::MODAL_OPENED).await;
                Ok(())
            }
            Err(e) => {
                error!(user_id = %user_id, "Failed to open selection modal: {}", e);
                self.metrics.increment_counter(metrics::MODAL_OPEN_ERROR).await;
                let notifier = Notifier::new(api);
                if let Err(dm_err) = notifier.send_to_user(user_id, OPEN_FAILED).await {
                    debug!("Error notification failed as well: {}", dm_err);
                }
                Err(e)
            }
        }
    }

    /// Finish an accepted submission: tell the user, start the job once,
    /// report the outcome. Nothing here is retried.
    ///
    /// The job is started even when `notifier` is `None`; the user's messages
    /// are then skipped and logged.
    pub async fn complete(
        &self,
        notifier: Option<&Notifier>,
        jobs: &dyn JobTrigger,
        request: JobRequest,
    ) -> Option<JobHandle> {
        let action = request.action.clone();
        let user_id = request.user_id.clone();

        notify_best_effort(notifier, &user_id, &received_message(&action)).await;

        match jobs.start(&request).await {
            Ok(handle) => {
                info!(action = %action, job_id = %handle.id, "Job started");
                self.metrics.increment_counter(metrics::ACTION_EXECUTED).await;
                notify_best_effort(notifier, &user_id, &started_message(&action, &handle)).await;
                Some(handle)
            }
            Err(e) => {
                error!(action = %action, user_id = %user_id, "Failed to start job: {}", e);
                self.metrics.increment_counter(metrics::JOB_START_ERROR).await;
                self.metrics
                    .increment_counter(metrics::ACTION_EXECUTION_ERROR)
                    .await;
                notify_best_effort(notifier, &user_id, &failed_message(&action)).await;
                None
            }
        }
    }
}

async fn notify_best_effort(notifier: Option<&Notifier>, user_id: &str, message: &str) {
    let Some(notifier) = notifier else {
        warn!(user_id = %user_id, "Slack unavailable; user not notified");
        return;
    };
    if let Err(e) = notifier.send_to_user(user_id, message).await {
        warn!(user_id = %user_id, "Failed to notify user: {}", e);
    }
}

fn received_message(action: &str) -> String {
    format!("✅ Your request for *{action}* has been received and is being processed...")
}

fn started_message(action: &str, handle: &JobHandle) -> String {
    format!(
        "🚀 *{action}* is now running!\nBuild ID: `{}`\nYou'll be notified when it completes.",
        handle.id
    )
}

fn failed_message(action: &str) -> String {
    format!("❌ Failed to execute action *{action}*. Please contact support if this continues.")
}
