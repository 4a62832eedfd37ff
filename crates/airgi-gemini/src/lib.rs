// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini assistant adapter for the AIRGI incident intake.
//!
//! This crate implements [`AssistantAdapter`] on top of the Gemini
//! `streamGenerateContent` endpoint. Every turn is sent together with the
//! session's system instruction and full history, and the reply comes back
//! as an ordered stream of text fragments.

pub mod client;
pub mod sse;
pub mod types;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::stream::StreamExt;
use tracing::{debug, info, warn};

use airgi_config::model::AssistantConfig;
use airgi_core::{
    AdapterType, AirgiError, AssistantAdapter, Attachment, ContextRole, ContextTurn,
    DialogueSession, FragmentStream, HealthStatus, OutgoingTurn, PluginAdapter,
};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, Part};

/// Environment variable consulted when the config carries no key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Gemini assistant implementing [`AssistantAdapter`].
///
/// Construction never fails for a missing key: the adapter stays
/// constructible so the intake can still start, and every
/// [`open_session`](AssistantAdapter::open_session) reports
/// [`AirgiError::AssistantUnavailable`] instead.
pub struct GeminiAssistant {
    client: Option<GeminiClient>,
    unavailable_reason: String,
}

impl GeminiAssistant {
    /// Creates the adapter. API key resolution: config, then `GEMINI_API_KEY`.
    pub fn new(config: &AssistantConfig) -> Result<Self, AirgiError> {
        Self::with_key(resolve_api_key(&config.api_key), config)
    }

    /// Creates the adapter with an explicit key, bypassing the environment.
    pub fn with_key(api_key: Option<String>, config: &AssistantConfig) -> Result<Self, AirgiError> {
        match api_key {
            Some(key) => {
                let client =
                    GeminiClient::new(&key, config.model.clone(), config.base_url.clone())?;
                info!(model = %config.model, "Gemini assistant initialized");
                Ok(Self {
                    client: Some(client),
                    unavailable_reason: String::new(),
                })
            }
            None => {
                warn!("no Gemini API key configured; assistant disabled");
                Ok(Self {
                    client: None,
                    unavailable_reason: format!(
                        "Gemini API key not found. Set assistant.api_key in config or the {API_KEY_ENV} environment variable."
                    ),
                })
            }
        }
    }

    fn client(&self) -> Result<&GeminiClient, AirgiError> {
        self.client
            .as_ref()
            .ok_or_else(|| AirgiError::AssistantUnavailable(self.unavailable_reason.clone()))
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Option<String> {
    if let Some(key) = config_key
        && !key.trim().is_empty()
    {
        return Some(key.clone());
    }
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

/// Builds the wire request for `turn` in the context of `session`.
fn build_request(session: &DialogueSession, turn: &OutgoingTurn) -> GenerateContentRequest {
    let mut contents: Vec<Content> = session.history().iter().map(context_content).collect();
    contents.push(Content::new(
        "user",
        turn_parts(&turn.text, &turn.attachments),
    ));

    let system_instruction = (!session.system_instruction.is_empty()).then(|| Content {
        role: None,
        parts: vec![Part::text(session.system_instruction.clone())],
    });

    GenerateContentRequest {
        system_instruction,
        contents,
    }
}

fn context_content(turn: &ContextTurn) -> Content {
    let role = match turn.role {
        ContextRole::User => "user",
        ContextRole::Assistant => "model",
    };
    Content::new(role, turn_parts(&turn.text, &turn.attachments))
}

fn turn_parts(text: &str, attachments: &[Attachment]) -> Vec<Part> {
    let mut parts = Vec::with_capacity(attachments.len() + 1);
    if !text.is_empty() || attachments.is_empty() {
        parts.push(Part::text(text));
    }
    parts.extend(attachments.iter().map(attachment_part));
    parts
}

/// Images travel inline. Anything else is described to the model by name.
fn attachment_part(attachment: &Attachment) -> Part {
    if attachment.is_image() {
        match &attachment.content {
            Some(bytes) => Part::inline(attachment.mime_type.clone(), STANDARD.encode(bytes)),
            None => Part::text(format!(
                "[System: Failed to process attachment {}]",
                attachment.name
            )),
        }
    } else {
        Part::text(format!(
            "[System: User attached a file named \"{}\" of type {}. Content not directly viewable by AI in this turn.]",
            attachment.name, attachment.mime_type
        ))
    }
}

#[async_trait]
impl PluginAdapter for GeminiAssistant {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Assistant
    }

    async fn health_check(&self) -> Result<HealthStatus, AirgiError> {
        // No probe request: a health check should not spend quota.
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy(self.unavailable_reason.clone()),
        })
    }

    async fn shutdown(&self) -> Result<(), AirgiError> {
        debug!("Gemini assistant shutting down");
        Ok(())
    }
}

#[async_trait]
impl AssistantAdapter for GeminiAssistant {
    async fn open_session(
        &self,
        system_instruction: &str,
        prior: Vec<ContextTurn>,
    ) -> Result<DialogueSession, AirgiError> {
        let client = self.client()?;
        let session = DialogueSession::new(system_instruction, prior);
        debug!(
            session_id = %session.id,
            model = client.model(),
            prior_turns = session.history().len(),
            "dialogue session opened"
        );
        Ok(session)
    }

    async fn send_turn(
        &self,
        session: &DialogueSession,
        turn: &OutgoingTurn,
    ) -> Result<FragmentStream, AirgiError> {
        let client = self.client()?;
        let request = build_request(session, turn);
        debug!(
            session_id = %session.id,
            contents = request.contents.len(),
            attachments = turn.attachments.len(),
            "sending turn"
        );

        let chunks = client.stream_generate(&request).await?;
        let fragments = chunks.filter_map(|chunk| async move {
            match chunk {
                Ok(resp) => {
                    if let Some(reason) = resp
                        .prompt_feedback
                        .as_ref()
                        .and_then(|f| f.block_reason.as_ref())
                    {
                        return Some(Err(AirgiError::Assistant {
                            message: format!("prompt blocked by the service: {reason}"),
                            source: None,
                        }));
                    }
                    let text = resp.text();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use airgi_core::AttachmentId;

    fn file(name: &str, mime: &str, content: Option<&[u8]>) -> Attachment {
        Attachment {
            id: AttachmentId::generate(),
            name: name.into(),
            mime_type: mime.into(),
            size: content.map_or(0, |c| c.len() as u64),
            preview: None,
            content: content.map(Arc::from),
        }
    }

    #[test]
    fn config_key_wins_over_env() {
        assert_eq!(
            resolve_api_key(&Some("cfg-key".into())).as_deref(),
            Some("cfg-key")
        );
    }

    #[test]
    fn blank_config_key_is_ignored() {
        // Falls through to the environment, which may or may not be set.
        if let Some(key) = resolve_api_key(&Some("  ".into())) {
            assert!(!key.trim().is_empty());
        }
    }

    #[tokio::test]
    async fn missing_key_makes_sessions_unavailable() {
        let assistant = GeminiAssistant::with_key(None, &AssistantConfig::default()).unwrap();
        let err = assistant.open_session("x", Vec::new()).await.unwrap_err();
        assert!(matches!(err, AirgiError::AssistantUnavailable(_)));
        assert!(matches!(
            assistant.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[test]
    fn request_carries_instruction_history_and_turn() {
        let prior = vec![
            ContextTurn {
                role: ContextRole::User,
                text: "falla el login".into(),
                attachments: Vec::new(),
            },
            ContextTurn {
                role: ContextRole::Assistant,
                text: "¿Qué navegador?".into(),
                attachments: Vec::new(),
            },
        ];
        let session = DialogueSession::new("Eres AIRGI", prior);
        let req = build_request(&session, &OutgoingTurn::text("Chrome"));

        let system = req.system_instruction.unwrap();
        assert_eq!(system.parts[0].text.as_deref(), Some("Eres AIRGI"));
        let roles: Vec<_> = req
            .contents
            .iter()
            .map(|c| c.role.clone().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(req.contents[2].parts[0].text.as_deref(), Some("Chrome"));
    }

    #[test]
    fn images_inline_and_other_files_as_placeholder() {
        let turn = OutgoingTurn {
            text: "adjunto".into(),
            attachments: vec![
                file("captura.png", "image/png", Some(b"png")),
                file("log.txt", "text/plain", Some(b"boom")),
            ],
        };
        let session = DialogueSession::new("", Vec::new());
        let req = build_request(&session, &turn);
        assert!(req.system_instruction.is_none());

        let parts = &req.contents[0].parts;
        assert_eq!(parts.len(), 3);
        let blob = parts[1].inline_data.as_ref().unwrap();
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(blob.data, STANDARD.encode(b"png"));
        let placeholder = parts[2].text.as_deref().unwrap();
        assert!(placeholder.contains("\"log.txt\""));
        assert!(placeholder.contains("text/plain"));
    }

    #[test]
    fn image_without_content_is_described() {
        let part = attachment_part(&file("a.png", "image/png", None));
        assert_eq!(
            part.text.as_deref(),
            Some("[System: Failed to process attachment a.png]")
        );
    }
}
