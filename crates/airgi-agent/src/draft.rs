// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The in-memory aggregate one intake session builds up before saving.

use airgi_core::{
    Attachment, ChatTurn, Identity, IncidentId, PersistedIncident, StructuredRecord, UserId,
};

use crate::reconcile::Submission;

/// Transcript, extracted record, and save target of one intake session.
///
/// `draft_key` is fixed when the draft is created and is the id a new
/// incident is written under, so every save attempt of the same draft
/// targets the same record.
#[derive(Debug, Clone)]
pub struct ConversationDraft {
    pub draft_key: IncidentId,
    pub existing: Option<IncidentId>,
    pub existing_title: Option<String>,
    pub original_description: String,
    pub transcript: Vec<ChatTurn>,
    pub record: Option<StructuredRecord>,
    /// Raw text of the last presented summary.
    pub summary_text: Option<String>,
    pub assignee: Option<UserId>,
}

impl ConversationDraft {
    /// A draft for a new report.
    pub fn new(original_description: impl Into<String>) -> Self {
        Self {
            draft_key: IncidentId::generate(),
            existing: None,
            existing_title: None,
            original_description: original_description.into(),
            transcript: Vec::new(),
            record: None,
            summary_text: None,
            assignee: None,
        }
    }

    /// A draft continuing a persisted incident, seeded with its transcript.
    pub fn for_incident(incident: &PersistedIncident) -> Self {
        Self {
            draft_key: incident.id.clone(),
            existing: Some(incident.id.clone()),
            existing_title: Some(incident.title.clone()),
            original_description: incident.original_description.clone(),
            transcript: incident.transcript.clone(),
            record: None,
            summary_text: incident.summary_text.clone(),
            assignee: incident.assigned_to.clone(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.existing.is_some()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.transcript.push(turn);
    }

    /// Every attachment carried by the transcript, in turn order.
    pub fn attachments(&self) -> Vec<Attachment> {
        self.transcript
            .iter()
            .flat_map(|turn| turn.attachments.iter().cloned())
            .collect()
    }

    pub fn clear_summary(&mut self) {
        self.record = None;
        self.summary_text = None;
    }

    /// Borrows the draft as a save request. `None` until a record exists.
    pub fn submission<'a>(
        &'a self,
        reporter: &'a Identity,
        attachments: &'a [Attachment],
    ) -> Option<Submission<'a>> {
        let record = self.record.as_ref()?;
        Some(Submission {
            draft_key: &self.draft_key,
            existing_id: self.existing.as_ref(),
            original_description: &self.original_description,
            transcript: &self.transcript,
            record,
            summary_text: self.summary_text.as_deref(),
            attachments,
            reporter,
            assignee: self.assignee.as_ref(),
        })
    }
}
