// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock assistant adapter for deterministic testing.
//!
//! `MockAssistant` implements `AssistantAdapter` with scripted replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use airgi_core::traits::adapter::PluginAdapter;
use airgi_core::traits::assistant::{
    AssistantAdapter, ContextTurn, DialogueSession, FragmentStream, OutgoingTurn,
};
use airgi_core::types::{AdapterType, HealthStatus};
use airgi_core::AirgiError;

/// One scripted reply, consumed by one `send_turn`.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Fragments yielded in order.
    Fragments(Vec<String>),
    /// Fragments yielded in order, then a stream error.
    FailMidStream {
        fragments: Vec<String>,
        message: String,
    },
    /// `send_turn` itself fails before any fragment.
    SendError(String),
    /// A stream that never yields.
    Stall,
}

impl ScriptedReply {
    /// A reply delivered as a single fragment.
    pub fn text(text: impl Into<String>) -> Self {
        ScriptedReply::Fragments(vec![text.into()])
    }

    /// A reply split into one fragment per item.
    pub fn chunks(chunks: &[&str]) -> Self {
        ScriptedReply::Fragments(chunks.iter().map(|c| c.to_string()).collect())
    }
}

/// A turn as the assistant received it.
#[derive(Debug, Clone)]
pub struct RecordedTurn {
    pub session_id: String,
    pub system_instruction: String,
    /// Session history at the time of sending, excluding this turn.
    pub history: Vec<ContextTurn>,
    pub turn: OutgoingTurn,
}

/// A session open request.
#[derive(Debug, Clone)]
pub struct RecordedOpen {
    pub system_instruction: String,
    pub prior: Vec<ContextTurn>,
}

/// A mock assistant that replays scripted replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned.
pub struct MockAssistant {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    sent: Arc<Mutex<Vec<RecordedTurn>>>,
    opened: Arc<Mutex<Vec<RecordedOpen>>>,
    stalled_opens: Arc<Mutex<usize>>,
    unavailable: Option<String>,
}

impl MockAssistant {
    /// Create a new mock assistant with an empty reply queue.
    pub fn new() -> Self {
        Self::with_replies(Vec::new())
    }

    /// Create a mock assistant pre-loaded with the given replies.
    pub fn with_replies(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            sent: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(Mutex::new(Vec::new())),
            stalled_opens: Arc::new(Mutex::new(0)),
            unavailable: None,
        }
    }

    /// A mock whose every `open_session` fails with `AssistantUnavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Make the next `count` calls to `open_session` never complete.
    pub async fn stall_opens(&self, count: usize) {
        *self.stalled_opens.lock().await = count;
    }

    /// Add a reply to the end of the queue.
    pub async fn add_reply(&self, reply: ScriptedReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Every turn received so far, in order.
    pub async fn sent_turns(&self) -> Vec<RecordedTurn> {
        self.sent.lock().await.clone()
    }

    /// Every session opened so far, in order.
    pub async fn opened_sessions(&self) -> Vec<RecordedOpen> {
        self.opened.lock().await.clone()
    }

    async fn next_reply(&self) -> ScriptedReply {
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::text("mock response"))
    }
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockAssistant {
    fn name(&self) -> &str {
        "mock-assistant"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Assistant
    }

    async fn health_check(&self) -> Result<HealthStatus, AirgiError> {
        Ok(match &self.unavailable {
            Some(reason) => HealthStatus::Unhealthy(reason.clone()),
            None => HealthStatus::Healthy,
        })
    }

    async fn shutdown(&self) -> Result<(), AirgiError> {
        Ok(())
    }
}

#[async_trait]
impl AssistantAdapter for MockAssistant {
    async fn open_session(
        &self,
        system_instruction: &str,
        prior: Vec<ContextTurn>,
    ) -> Result<DialogueSession, AirgiError> {
        if let Some(reason) = &self.unavailable {
            return Err(AirgiError::AssistantUnavailable(reason.clone()));
        }
        let stall = {
            let mut remaining = self.stalled_opens.lock().await;
            let stall = *remaining > 0;
            *remaining = remaining.saturating_sub(1);
            stall
        };
        if stall {
            futures::future::pending::<()>().await;
        }
        self.opened.lock().await.push(RecordedOpen {
            system_instruction: system_instruction.to_string(),
            prior: prior.clone(),
        });
        Ok(DialogueSession::new(system_instruction, prior))
    }

    async fn send_turn(
        &self,
        session: &DialogueSession,
        turn: &OutgoingTurn,
    ) -> Result<FragmentStream, AirgiError> {
        self.sent.lock().await.push(RecordedTurn {
            session_id: session.id.clone(),
            system_instruction: session.system_instruction.clone(),
            history: session.history().to_vec(),
            turn: turn.clone(),
        });

        let stream: FragmentStream = match self.next_reply().await {
            ScriptedReply::Fragments(fragments) => {
                Box::pin(stream::iter(fragments.into_iter().map(Ok)))
            }
            ScriptedReply::FailMidStream { fragments, message } => Box::pin(
                stream::iter(fragments.into_iter().map(Ok)).chain(stream::once(async move {
                    Err(AirgiError::Assistant {
                        message,
                        source: None,
                    })
                })),
            ),
            ScriptedReply::SendError(message) => {
                return Err(AirgiError::Assistant {
                    message,
                    source: None,
                });
            }
            ScriptedReply::Stall => Box::pin(stream::pending()),
        };
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(assistant: &MockAssistant, session: &DialogueSession) -> Result<String, AirgiError> {
        let mut stream = assistant
            .send_turn(session, &OutgoingTurn::text("hola"))
            .await?;
        let mut out = String::new();
        while let Some(fragment) = stream.next().await {
            out.push_str(&fragment?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn default_reply_when_queue_empty() {
        let assistant = MockAssistant::new();
        let session = assistant.open_session("sys", Vec::new()).await.unwrap();
        assert_eq!(drain(&assistant, &session).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn queued_replies_returned_in_order() {
        let assistant = MockAssistant::with_replies(vec![
            ScriptedReply::chunks(&["pri", "mero"]),
            ScriptedReply::text("segundo"),
        ]);
        let session = assistant.open_session("sys", Vec::new()).await.unwrap();
        assert_eq!(drain(&assistant, &session).await.unwrap(), "primero");
        assert_eq!(drain(&assistant, &session).await.unwrap(), "segundo");
        assert_eq!(assistant.sent_turns().await.len(), 2);
    }

    #[tokio::test]
    async fn mid_stream_failure_surfaces_after_fragments() {
        let assistant = MockAssistant::with_replies(vec![ScriptedReply::FailMidStream {
            fragments: vec!["medio".into()],
            message: "connection reset".into(),
        }]);
        let session = assistant.open_session("sys", Vec::new()).await.unwrap();
        let err = drain(&assistant, &session).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_open_never_completes_then_recovers() {
        let assistant = MockAssistant::new();
        assistant.stall_opens(1).await;
        let first = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            assistant.open_session("sys", Vec::new()),
        )
        .await;
        assert!(first.is_err());
        assert!(assistant.open_session("sys", Vec::new()).await.is_ok());
        assert_eq!(assistant.opened_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_mock_refuses_sessions() {
        let assistant = MockAssistant::unavailable("no key");
        assert!(matches!(
            assistant.open_session("sys", Vec::new()).await,
            Err(AirgiError::AssistantUnavailable(_))
        ));
    }
}
