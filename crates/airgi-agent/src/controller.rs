// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-intake FSM that carries one report from first message to saved incident.
//!
//! States: Initializing -> AwaitingUserInput <-> AiResponding -> SummaryPresented
//! -> Saving -> Saved. Unavailable is entered when the assistant reports that
//! no session can be opened at all.
//!
//! The controller integrates:
//! - **Assistant**: one dialogue session, turns strictly serialized
//! - **Extraction**: the presented summary parsed into a structured record
//! - **Reconciler**: the confirmed draft written and re-read
//! - **Attachments and composer**: the input side of the next turn

use std::sync::Arc;
use std::time::Duration;

use airgi_config::model::AirgiConfig;
use airgi_core::{
    AirgiError, AssistantAdapter, ChatTurn, ContextTurn, DialogueSession, Identity,
    IncidentStore, OutgoingTurn, PersistedIncident, StructuredRecord, UserId,
};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::attachments::{AttachmentManager, AttachmentPolicy};
use crate::deadline::bounded;
use crate::draft::ConversationDraft;
use crate::extraction::{ParseContext, parse_summary};
use crate::prompts;
use crate::reconcile::Reconciler;
use crate::speech::Composer;

/// States in the intake FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeState {
    /// Created, no assistant session yet.
    Initializing,
    AwaitingUserInput,
    /// A turn is out and its reply is being drained.
    AiResponding,
    /// A structured summary is waiting for confirmation or revision.
    SummaryPresented,
    Saving,
    /// The draft is persisted. Terminal for this controller.
    Saved,
    /// No assistant session could be opened. Terminal until reconfigured.
    Unavailable,
}

impl std::fmt::Display for IntakeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeState::Initializing => write!(f, "initializing"),
            IntakeState::AwaitingUserInput => write!(f, "awaiting user input"),
            IntakeState::AiResponding => write!(f, "waiting for the assistant"),
            IntakeState::SummaryPresented => write!(f, "a summary is presented"),
            IntakeState::Saving => write!(f, "saving"),
            IntakeState::Saved => write!(f, "saved"),
            IntakeState::Unavailable => write!(f, "the assistant is unavailable"),
        }
    }
}

/// What a completed exchange led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant replied with a regular turn.
    Replied,
    /// The reply presented a summary, now parsed into a record.
    SummaryPresented,
    /// The exchange failed and a system note was appended instead.
    Recovered,
}

/// Limits applied by every controller.
#[derive(Debug, Clone)]
pub struct IntakeSettings {
    pub open_timeout: Duration,
    pub turn_timeout: Duration,
    pub save_timeout: Duration,
    pub title_fallback_chars: usize,
    pub attachment_policy: AttachmentPolicy,
}

impl IntakeSettings {
    pub fn from_config(config: &AirgiConfig) -> Self {
        Self {
            open_timeout: config.assistant.open_timeout(),
            turn_timeout: config.assistant.turn_timeout(),
            save_timeout: config.intake.save_timeout(),
            title_fallback_chars: config.intake.title_fallback_chars,
            attachment_policy: AttachmentPolicy::from_config(&config.intake),
        }
    }
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self::from_config(&AirgiConfig::default())
    }
}

/// Backends and settings shared by every intake, built once at startup.
#[derive(Clone)]
pub struct IntakeContext {
    pub assistant: Arc<dyn AssistantAdapter>,
    pub store: Arc<dyn IncidentStore>,
    pub settings: IntakeSettings,
}

impl IntakeContext {
    pub fn new(
        assistant: Arc<dyn AssistantAdapter>,
        store: Arc<dyn IncidentStore>,
        settings: IntakeSettings,
    ) -> Self {
        Self {
            assistant,
            store,
            settings,
        }
    }
}

/// Owns one intake session and its draft.
pub struct ConversationController {
    assistant: Arc<dyn AssistantAdapter>,
    reconciler: Reconciler,
    settings: IntakeSettings,
    reporter: Identity,
    state: IntakeState,
    session: Option<DialogueSession>,
    draft: ConversationDraft,
    attachments: AttachmentManager,
    composer: Composer,
    acknowledged: bool,
    saved: Option<PersistedIncident>,
    cancel: CancellationToken,
}

impl ConversationController {
    fn with_draft(ctx: &IntakeContext, reporter: Identity, draft: ConversationDraft) -> Self {
        Self {
            assistant: Arc::clone(&ctx.assistant),
            reconciler: Reconciler::new(Arc::clone(&ctx.store), ctx.settings.save_timeout),
            settings: ctx.settings.clone(),
            reporter,
            state: IntakeState::Initializing,
            session: None,
            draft,
            attachments: AttachmentManager::new(ctx.settings.attachment_policy.clone()),
            composer: Composer::new(),
            acknowledged: false,
            saved: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A controller for a new report starting from `description`.
    pub fn start_new(ctx: &IntakeContext, reporter: Identity, description: &str) -> Self {
        Self::with_draft(ctx, reporter, ConversationDraft::new(description))
    }

    /// A controller continuing `incident`, seeded with its stored transcript.
    pub fn reopen(ctx: &IntakeContext, reporter: Identity, incident: &PersistedIncident) -> Self {
        Self::with_draft(ctx, reporter, ConversationDraft::for_incident(incident))
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.draft.transcript
    }

    pub fn record(&self) -> Option<&StructuredRecord> {
        self.draft.record.as_ref()
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.draft.summary_text.as_deref()
    }

    pub fn draft(&self) -> &ConversationDraft {
        &self.draft
    }

    pub fn reporter(&self) -> &Identity {
        &self.reporter
    }

    /// The persisted incident, once saved.
    pub fn saved(&self) -> Option<&PersistedIncident> {
        self.saved.as_ref()
    }

    pub fn attachments(&self) -> &AttachmentManager {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut AttachmentManager {
        &mut self.attachments
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// A handle that cancels this session's outstanding and future calls.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Sets or clears the assignee written with the next save.
    pub fn assign(&mut self, assignee: Option<UserId>) -> Result<(), AirgiError> {
        if matches!(self.state, IntakeState::Saving | IntakeState::Saved) {
            return Err(self.invalid("change the assignee"));
        }
        self.draft.assignee = assignee;
        Ok(())
    }

    fn invalid(&self, operation: &'static str) -> AirgiError {
        AirgiError::InvalidState {
            state: self.state.to_string(),
            operation,
        }
    }

    fn expect_state(
        &self,
        expected: IntakeState,
        operation: &'static str,
    ) -> Result<(), AirgiError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn transition(&mut self, next: IntakeState) {
        debug!(
            draft = %self.draft.draft_key,
            from = %self.state,
            to = %next,
            "intake state change"
        );
        self.state = next;
    }

    /// Opens the assistant session and produces the first assistant turn.
    ///
    /// A new report sends the initial description as the first user turn.
    /// A re-opened incident replays its transcript as context and gets a
    /// greeting without any user turn.
    ///
    /// Only `AssistantUnavailable` is terminal. Any other open failure
    /// (timeout, cancellation, transport) leaves the controller in
    /// `Initializing` with a communication note, and may be retried.
    pub async fn initialize(&mut self) -> Result<TurnOutcome, AirgiError> {
        self.expect_state(IntakeState::Initializing, "initialize")?;

        let (instruction, prior) = match &self.draft.existing_title {
            Some(title) => (
                prompts::reopen_instruction(
                    title,
                    &self.reporter.name,
                    self.draft.summary_text.as_deref(),
                ),
                ContextTurn::from_transcript(&self.draft.transcript),
            ),
            None => (
                prompts::new_report_instruction(
                    &self.draft.original_description,
                    &self.reporter.name,
                ),
                Vec::new(),
            ),
        };

        let opened = bounded(
            self.assistant.open_session(&instruction, prior),
            self.settings.open_timeout,
            &self.cancel,
        )
        .await;
        let session = match opened {
            Ok(session) => session,
            Err(e @ AirgiError::AssistantUnavailable(_)) => {
                warn!(draft = %self.draft.draft_key, error = %e, "assistant session unavailable");
                self.draft.push(ChatTurn::system(prompts::UNAVAILABLE_NOTE));
                self.transition(IntakeState::Unavailable);
                return Err(e);
            }
            Err(e) => {
                // Stays in Initializing so the open can be retried.
                warn!(draft = %self.draft.draft_key, error = %e, "assistant session open failed");
                self.draft
                    .push(ChatTurn::system(prompts::COMMUNICATION_FAILURE_NOTE));
                return Err(e);
            }
        };
        info!(
            draft = %self.draft.draft_key,
            session_id = %session.id,
            edit = self.draft.is_edit(),
            "intake session opened"
        );
        self.session = Some(session);

        if self.draft.is_edit() {
            self.exchange(OutgoingTurn::text(prompts::REOPEN_TRIGGER), Exchange::Dialogue)
                .await
        } else {
            let description = self.draft.original_description.clone();
            self.draft.push(ChatTurn::user(description.clone(), Vec::new()));
            self.exchange(OutgoingTurn::text(description), Exchange::Dialogue)
                .await
        }
    }

    /// Sends the composed text and pending attachments as one user turn.
    pub async fn send(&mut self) -> Result<TurnOutcome, AirgiError> {
        self.expect_state(IntakeState::AwaitingUserInput, "send a message")?;
        if self.composer.is_empty() && self.attachments.is_empty() {
            return Err(AirgiError::EmptyTurn);
        }

        self.attachments.settle_previews().await;
        let typed = self.composer.take();
        let attachments = self.attachments.take_for_send();
        let text = if typed.trim().is_empty() {
            prompts::ATTACHMENT_ONLY_TEXT.to_string()
        } else {
            typed.trim().to_string()
        };

        self.draft
            .push(ChatTurn::user(text.clone(), attachments.clone()));
        self.exchange(OutgoingTurn { text, attachments }, Exchange::Dialogue)
            .await
    }

    /// Replaces the composer text and sends it.
    pub async fn send_text(&mut self, text: &str) -> Result<TurnOutcome, AirgiError> {
        self.expect_state(IntakeState::AwaitingUserInput, "send a message")?;
        self.composer.set_text(text);
        self.send().await
    }

    /// Asks the assistant for the structured summary.
    ///
    /// The request is a real turn of the session but is not shown in the
    /// transcript.
    pub async fn request_summary(&mut self) -> Result<TurnOutcome, AirgiError> {
        self.expect_state(IntakeState::AwaitingUserInput, "request a summary")?;
        let request = prompts::summary_request(self.draft.is_edit());
        self.exchange(OutgoingTurn::text(request), Exchange::Summary)
            .await
    }

    /// Rejects the presented summary and asks to keep talking.
    pub async fn request_revision(&mut self) -> Result<TurnOutcome, AirgiError> {
        self.expect_state(IntakeState::SummaryPresented, "revise the summary")?;
        self.draft.clear_summary();
        self.draft
            .push(ChatTurn::user(prompts::REVISION_REQUEST, Vec::new()));
        self.exchange(
            OutgoingTurn::text(prompts::REVISION_REQUEST),
            Exchange::Dialogue,
        )
        .await
    }

    /// Confirms the presented summary and saves the draft.
    ///
    /// On failure the controller returns to the presented summary with a
    /// system note appended; the draft is untouched and the call may be
    /// retried.
    pub async fn confirm(&mut self) -> Result<PersistedIncident, AirgiError> {
        self.expect_state(IntakeState::SummaryPresented, "confirm the summary")?;
        self.transition(IntakeState::Saving);

        if !self.acknowledged {
            self.acknowledged = true;
            self.acknowledge().await;
        }

        let attachments = self.draft.attachments();
        let result = match self.draft.submission(&self.reporter, &attachments) {
            Some(submission) => self.reconciler.reconcile(&submission, &self.cancel).await,
            None => Err(AirgiError::Internal(
                "summary presented without a structured record".into(),
            )),
        };

        match result {
            Ok(incident) => {
                info!(
                    draft = %self.draft.draft_key,
                    incident_id = %incident.id,
                    "intake saved"
                );
                self.saved = Some(incident.clone());
                self.transition(IntakeState::Saved);
                Ok(incident)
            }
            Err(e) => {
                warn!(draft = %self.draft.draft_key, error = %e, "save failed, draft kept for retry");
                self.draft.push(ChatTurn::system(prompts::SAVE_FAILURE_NOTE));
                self.transition(IntakeState::SummaryPresented);
                Err(e)
            }
        }
    }

    /// Sends the fixed confirmation turn. Never fails the save.
    async fn acknowledge(&mut self) {
        let outgoing = OutgoingTurn::text(prompts::CONFIRMATION_TURN);
        let reply = match self.session.as_ref() {
            Some(session) => {
                bounded(
                    collect_reply(self.assistant.as_ref(), session, &outgoing),
                    self.settings.turn_timeout,
                    &self.cancel,
                )
                .await
            }
            None => Err(self.invalid("acknowledge")),
        };
        match reply {
            Ok(reply) if !reply.trim().is_empty() => {
                if let Some(session) = self.session.as_mut() {
                    session.record_exchange(&outgoing, &reply);
                }
                self.draft.push(ChatTurn::assistant(reply));
            }
            Ok(_) => self.draft.push(ChatTurn::assistant(prompts::ACKNOWLEDGEMENT)),
            Err(e) => {
                warn!(error = %e, "confirmation acknowledgement failed");
                self.draft.push(ChatTurn::assistant(prompts::ACKNOWLEDGEMENT));
            }
        }
    }

    /// Sends one turn and drains its reply. Assistant failures are recovered
    /// here and never returned as errors.
    async fn exchange(
        &mut self,
        outgoing: OutgoingTurn,
        kind: Exchange,
    ) -> Result<TurnOutcome, AirgiError> {
        let session_id = match self.session.as_ref() {
            Some(session) => session.id.clone(),
            None => return Err(self.invalid("talk to the assistant")),
        };
        self.transition(IntakeState::AiResponding);

        let reply = match self.session.as_ref() {
            Some(session) => {
                bounded(
                    collect_reply(self.assistant.as_ref(), session, &outgoing),
                    self.settings.turn_timeout,
                    &self.cancel,
                )
                .await
            }
            None => Err(self.invalid("talk to the assistant")),
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "assistant exchange failed");
                let note = match kind {
                    Exchange::Summary => prompts::SUMMARY_FAILURE_NOTE,
                    Exchange::Dialogue => prompts::COMMUNICATION_FAILURE_NOTE,
                };
                self.draft.push(ChatTurn::system(note));
                self.transition(IntakeState::AwaitingUserInput);
                return Ok(TurnOutcome::Recovered);
            }
        };

        if let Some(session) = self.session.as_mut() {
            session.record_exchange(&outgoing, &reply);
        }
        self.draft.push(ChatTurn::assistant(reply.clone()));

        if kind == Exchange::Summary || prompts::is_summary_presentation(&reply) {
            let ctx = ParseContext {
                existing_title: self.draft.existing_title.clone(),
                original_description: self.draft.original_description.clone(),
                reporter_name: self.reporter.name.clone(),
                title_fallback_chars: self.settings.title_fallback_chars,
            };
            let record = parse_summary(&reply, &ctx);
            debug!(session_id = %session_id, title = %record.title, "summary parsed");
            self.draft.record = Some(record);
            self.draft.summary_text = Some(reply);
            self.transition(IntakeState::SummaryPresented);
            Ok(TurnOutcome::SummaryPresented)
        } else {
            self.transition(IntakeState::AwaitingUserInput);
            Ok(TurnOutcome::Replied)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    Dialogue,
    Summary,
}

/// Sends `turn` and concatenates every fragment in arrival order.
async fn collect_reply(
    assistant: &dyn AssistantAdapter,
    session: &DialogueSession,
    turn: &OutgoingTurn,
) -> Result<String, AirgiError> {
    let mut fragments = assistant.send_turn(session, turn).await?;
    let mut reply = String::new();
    let mut count = 0usize;
    while let Some(fragment) = fragments.next().await {
        reply.push_str(&fragment?);
        count += 1;
    }
    debug!(session_id = %session.id, fragments = count, chars = reply.len(), "reply drained");
    Ok(reply)
}
