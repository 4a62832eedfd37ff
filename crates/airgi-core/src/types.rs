// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the intake pipeline.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AirgiError;
use crate::time::{normalize_timestamp, RawTimestamp};

/// Unique identifier for a persisted incident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub String);

impl IncidentId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for an attachment, assigned on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(pub String);

impl AttachmentId {
    pub fn generate() -> Self {
        Self(format!("file-{}", uuid::Uuid::new_v4()))
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of backend behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Assistant,
    Storage,
    Identity,
}

/// Who produced a turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
    System,
}

/// A file offered during a turn.
///
/// `content` is the client-side binary handle. It is never serialized, so
/// every persisted copy is metadata plus the optional preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Preview payload (a `data:` URL), filled in asynchronously for images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip)]
    pub content: Option<Arc<[u8]>>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Returns a copy with the binary handle stripped and the preview kept
    /// only when it is a non-empty string.
    pub fn sanitized(&self) -> Attachment {
        Attachment {
            id: self.id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
            preview: self.preview.clone().filter(|p| !p.is_empty()),
            content: None,
        }
    }
}

/// Why an offered file was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    DisallowedType(String),
    TooLarge { size: u64, max: u64 },
}

/// A single rejected file within an offered batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRejection {
    pub name: String,
    pub reason: RejectionReason,
}

impl fmt::Display for AttachmentRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            RejectionReason::DisallowedType(mime) => {
                write!(f, "file type not allowed: {} ({mime})", self.name)
            }
            RejectionReason::TooLarge { size, max } => write!(
                f,
                "file too large: {} ({:.1} MB, max {:.0} MB)",
                self.name,
                *size as f64 / (1024.0 * 1024.0),
                *max as f64 / (1024.0 * 1024.0)
            ),
        }
    }
}

/// One message in the dialogue. Immutable once appended to a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ChatTurn {
    fn new(sender: Sender, text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: format!("{sender}-{}", uuid::Uuid::new_v4()),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
            attachments,
        }
    }

    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self::new(Sender::User, text, attachments)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text, Vec::new())
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text, Vec::new())
    }
}

/// Typed fields parsed out of the assistant's final summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub title: String,
    pub steps_to_reproduce: String,
    pub expected_behavior: String,
    pub actual_behavior: String,
    pub impact: String,
    pub environment: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    /// Informational only. Never used as the persisted reporter.
    pub reporter_name_hint: String,
}

impl StructuredRecord {
    /// Renders the record for display, one labelled block per field.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut block = |label: &str, value: &str| {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(label);
            out.push_str(": ");
            out.push_str(value);
        };
        block("Título", &self.title);
        block("Pasos para reproducir", &self.steps_to_reproduce);
        block("Comportamiento esperado", &self.expected_behavior);
        block("Comportamiento actual", &self.actual_behavior);
        block("Impacto", &self.impact);
        if let Some(env) = &self.environment {
            block("Entorno", env);
        }
        if let Some(category) = &self.category {
            block("Categoría", category);
        }
        if let Some(priority) = &self.priority {
            block("Prioridad", priority);
        }
        block("Reportado por", &self.reporter_name_hint);
        out
    }
}

/// Lifecycle status of a persisted incident.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentStatus {
    New,
    InProgress,
    Resolved,
    Closed,
    PendingInfo,
}

impl IncidentStatus {
    /// Human-facing label, in the language of the intake dialogue.
    pub fn label(&self) -> &'static str {
        match self {
            IncidentStatus::New => "Nuevo",
            IncidentStatus::InProgress => "En progreso",
            IncidentStatus::Resolved => "Resuelto",
            IncidentStatus::Closed => "Cerrado",
            IncidentStatus::PendingInfo => "Pendiente de información",
        }
    }
}

/// Authorization role of a signed-in user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

/// A signed-in identity, also the shape of a stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A transcript turn in its stored shape: sanitized attachments and a
/// backend timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTurn {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: RawTimestamp,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl StoredTurn {
    /// Converts an in-memory turn to its stored shape.
    pub fn from_turn(turn: &ChatTurn) -> Self {
        Self {
            id: turn.id.clone(),
            sender: turn.sender,
            text: turn.text.clone(),
            timestamp: RawTimestamp::from(turn.timestamp),
            attachments: turn.attachments.iter().map(Attachment::sanitized).collect(),
        }
    }

    /// Converts a stored turn back, normalizing its timestamp.
    pub fn into_turn(self) -> Result<ChatTurn, AirgiError> {
        Ok(ChatTurn {
            id: self.id,
            sender: self.sender,
            text: self.text,
            timestamp: normalize_timestamp(self.timestamp)?,
            attachments: self.attachments,
        })
    }
}

/// The durable incident record, as re-read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedIncident {
    pub id: IncidentId,
    pub title: String,
    pub original_description: String,
    pub transcript: Vec<ChatTurn>,
    pub summary_text: Option<String>,
    pub steps_to_reproduce: String,
    pub expected_behavior: String,
    pub actual_behavior: String,
    pub impact: String,
    pub environment: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub attachments: Vec<Attachment>,
    pub reported_by: UserId,
    pub assigned_to: Option<UserId>,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields a store write carries.
///
/// `None` optional fields are omitted from the write, so an update never
/// blanks a previously persisted value. `reported_by` and `status` are only
/// set when creating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentWrite {
    pub title: String,
    pub original_description: String,
    pub transcript: Vec<StoredTurn>,
    pub summary_text: Option<String>,
    pub steps_to_reproduce: String,
    pub expected_behavior: String,
    pub actual_behavior: String,
    pub impact: String,
    pub environment: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub attachments: Vec<Attachment>,
    pub reported_by: Option<UserId>,
    pub assigned_to: Option<UserId>,
    pub status: Option<IncidentStatus>,
}

/// A change observed by incident subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentChange {
    Created(IncidentId),
    Updated(IncidentId),
    StatusChanged {
        id: IncidentId,
        status: IncidentStatus,
    },
    Deleted(IncidentId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn image() -> Attachment {
        Attachment {
            id: AttachmentId("file-1".into()),
            name: "screen.png".into(),
            mime_type: "image/png".into(),
            size: 3,
            preview: Some("data:image/png;base64,AAAA".into()),
            content: Some(Arc::from(vec![1u8, 2, 3])),
        }
    }

    #[test]
    fn sanitized_strips_binary_handle() {
        let clean = image().sanitized();
        assert!(clean.content.is_none());
        assert_eq!(clean.preview.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn sanitized_drops_empty_preview() {
        let mut att = image();
        att.preview = Some(String::new());
        assert!(att.sanitized().preview.is_none());
    }

    #[test]
    fn attachment_json_never_contains_content() {
        let json = serde_json::to_string(&image()).unwrap();
        assert!(!json.contains("content"));
        let back: Attachment = serde_json::from_str(&json).unwrap();
        assert!(back.content.is_none());
        assert_eq!(back.name, "screen.png");
    }

    #[test]
    fn stored_turn_round_trips_order_and_metadata() {
        let turn = ChatTurn::user("hola", vec![image()]);
        let stored = StoredTurn::from_turn(&turn);
        assert!(stored.attachments[0].content.is_none());

        let back = stored.into_turn().unwrap();
        assert_eq!(back.id, turn.id);
        assert_eq!(back.text, "hola");
        assert_eq!(back.timestamp, turn.timestamp);
        assert_eq!(back.attachments, vec![image().sanitized()]);
    }

    #[test]
    fn status_parses_snake_case() {
        assert_eq!(
            IncidentStatus::from_str("pending_info").unwrap(),
            IncidentStatus::PendingInfo
        );
        assert_eq!(IncidentStatus::InProgress.to_string(), "in_progress");
        assert_eq!(IncidentStatus::New.label(), "Nuevo");
    }

    #[test]
    fn render_skips_absent_optional_fields() {
        let record = StructuredRecord {
            title: "Login roto".into(),
            steps_to_reproduce: "1. Abrir".into(),
            expected_behavior: "Entrar".into(),
            actual_behavior: "Error 500".into(),
            impact: "Alto".into(),
            environment: None,
            category: Some("UI".into()),
            priority: None,
            reporter_name_hint: "Ana".into(),
        };
        let text = record.render();
        assert!(text.starts_with("Título: Login roto"));
        assert!(text.contains("Categoría: UI"));
        assert!(!text.contains("Entorno"));
        assert!(!text.contains("Prioridad"));
    }
}
