// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assistant adapter trait for the conversational AI service.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::AirgiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Attachment, ChatTurn, Sender};

/// The lazy, finite, non-restartable sequence of text fragments produced
/// for one turn. Fragments arrive in order and are concatenated as-is.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, AirgiError>> + Send>>;

/// Role of a turn as seen by the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRole {
    User,
    Assistant,
}

/// One turn of assistant context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextTurn {
    pub role: ContextRole,
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl ContextTurn {
    /// Builds replayable context from a stored transcript.
    ///
    /// Only user and assistant turns survive; system and error notes are
    /// dropped. Replayed turns are text-only.
    pub fn from_transcript(transcript: &[ChatTurn]) -> Vec<ContextTurn> {
        transcript
            .iter()
            .filter_map(|turn| {
                let role = match turn.sender {
                    Sender::User => ContextRole::User,
                    Sender::Assistant => ContextRole::Assistant,
                    Sender::System => return None,
                };
                Some(ContextTurn {
                    role,
                    text: turn.text.clone(),
                    attachments: Vec::new(),
                })
            })
            .collect()
    }
}

/// A turn about to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingTurn {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl OutgoingTurn {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }
}

/// An open dialogue with the assistant.
///
/// The history is explicit: every successfully drained exchange is
/// recorded, including hidden protocol turns such as the summary request,
/// so the next turn's context matches what the assistant has seen.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    pub id: String,
    pub system_instruction: String,
    history: Vec<ContextTurn>,
}

impl DialogueSession {
    pub fn new(system_instruction: impl Into<String>, prior: Vec<ContextTurn>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            system_instruction: system_instruction.into(),
            history: prior,
        }
    }

    /// Context preceding the next turn.
    pub fn history(&self) -> &[ContextTurn] {
        &self.history
    }

    /// Records a completed exchange.
    pub fn record_exchange(&mut self, sent: &OutgoingTurn, reply: &str) {
        self.history.push(ContextTurn {
            role: ContextRole::User,
            text: sent.text.clone(),
            attachments: sent.attachments.clone(),
        });
        self.history.push(ContextTurn {
            role: ContextRole::Assistant,
            text: reply.to_string(),
            attachments: Vec::new(),
        });
    }
}

/// Adapter for the conversational assistant service.
#[async_trait]
pub trait AssistantAdapter: PluginAdapter {
    /// Opens a dialogue with a system instruction and optional prior turns.
    ///
    /// Returns [`AirgiError::AssistantUnavailable`] when no usable session
    /// can be created (for example, missing credentials).
    async fn open_session(
        &self,
        system_instruction: &str,
        prior: Vec<ContextTurn>,
    ) -> Result<DialogueSession, AirgiError>;

    /// Sends one turn in the context of `session` and returns its fragments.
    ///
    /// Image attachments travel inline; other files are described by a
    /// placeholder naming the file and its type.
    async fn send_turn(
        &self,
        session: &DialogueSession,
        turn: &OutgoingTurn,
    ) -> Result<FragmentStream, AirgiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_keeps_user_and_assistant_text_only() {
        let mut with_file = ChatTurn::user("mira", Vec::new());
        with_file.attachments.push(Attachment {
            id: crate::types::AttachmentId("file-1".into()),
            name: "log.txt".into(),
            mime_type: "text/plain".into(),
            size: 10,
            preview: None,
            content: None,
        });
        let transcript = vec![
            with_file,
            ChatTurn::system("error al comunicarse"),
            ChatTurn::assistant("gracias"),
        ];

        let context = ContextTurn::from_transcript(&transcript);
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].role, ContextRole::User);
        assert!(context[0].attachments.is_empty());
        assert_eq!(context[1].text, "gracias");
    }

    #[test]
    fn record_exchange_appends_both_sides() {
        let mut session = DialogueSession::new("sys", Vec::new());
        session.record_exchange(&OutgoingTurn::text("hola"), "buenas");
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].role, ContextRole::Assistant);
    }
}
