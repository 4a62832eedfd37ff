// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a confirmed draft into a persisted incident.
//!
//! The store owns the clock: every write asks it to resolve the timestamps,
//! and the record returned to the caller is always the one re-read after the
//! write. A save whose re-read fails is reported as failed even if the write
//! itself went through.

use std::sync::Arc;
use std::time::Duration;

use airgi_core::{
    AirgiError, Attachment, ChatTurn, Identity, IncidentId, IncidentStatus, IncidentStore,
    IncidentWrite, PersistedIncident, StoredTurn, StructuredRecord, UserId,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::deadline::bounded;

/// Everything one save needs, borrowed from the draft.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub draft_key: &'a IncidentId,
    pub existing_id: Option<&'a IncidentId>,
    pub original_description: &'a str,
    pub transcript: &'a [ChatTurn],
    pub record: &'a StructuredRecord,
    pub summary_text: Option<&'a str>,
    pub attachments: &'a [Attachment],
    pub reporter: &'a Identity,
    pub assignee: Option<&'a UserId>,
}

impl Submission<'_> {
    /// The id the write targets.
    pub fn target(&self) -> &IncidentId {
        self.existing_id.unwrap_or(self.draft_key)
    }

    /// Builds the store write. Reporter and status are only sent on create.
    fn to_write(&self) -> IncidentWrite {
        let creating = self.existing_id.is_none();
        let record = self.record;
        IncidentWrite {
            title: record.title.clone(),
            original_description: self.original_description.to_string(),
            transcript: self.transcript.iter().map(StoredTurn::from_turn).collect(),
            summary_text: self
                .summary_text
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
            steps_to_reproduce: record.steps_to_reproduce.clone(),
            expected_behavior: record.expected_behavior.clone(),
            actual_behavior: record.actual_behavior.clone(),
            impact: record.impact.clone(),
            environment: record.environment.clone(),
            category: record.category.clone(),
            priority: record.priority.clone(),
            attachments: self.attachments.iter().map(Attachment::sanitized).collect(),
            reported_by: creating.then(|| self.reporter.id.clone()),
            assigned_to: self.assignee.cloned(),
            status: creating.then_some(IncidentStatus::New),
        }
    }
}

/// Writes drafts to an [`IncidentStore`] and re-reads the result.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn IncidentStore>,
    step_timeout: Duration,
}

impl Reconciler {
    pub fn new(store: Arc<dyn IncidentStore>, step_timeout: Duration) -> Self {
        Self {
            store,
            step_timeout,
        }
    }

    /// Creates or updates the incident, then returns the re-read record.
    ///
    /// The write and the re-read are each bounded by the step timeout and
    /// `cancel`. Any failure is a [`AirgiError::Persistence`].
    pub async fn reconcile(
        &self,
        submission: &Submission<'_>,
        cancel: &CancellationToken,
    ) -> Result<PersistedIncident, AirgiError> {
        let id = submission.target();
        let write = submission.to_write();

        if submission.existing_id.is_some() {
            debug!(incident_id = %id, "updating incident");
            bounded(
                self.store.update_incident(id, &write),
                self.step_timeout,
                cancel,
            )
            .await
            .map_err(|e| {
                warn!(incident_id = %id, error = %e, "incident update failed");
                AirgiError::persistence("failed to update incident", e)
            })?;
        } else {
            debug!(incident_id = %id, "creating incident");
            bounded(
                self.store.create_incident(id, &write),
                self.step_timeout,
                cancel,
            )
            .await
            .map_err(|e| {
                warn!(incident_id = %id, error = %e, "incident create failed");
                AirgiError::persistence("failed to create incident", e)
            })?;
        }

        let stored = bounded(self.store.get_incident(id), self.step_timeout, cancel)
            .await
            .map_err(|e| {
                warn!(incident_id = %id, error = %e, "re-read after write failed");
                AirgiError::persistence("failed to re-read incident after write", e)
            })?
            .ok_or_else(|| AirgiError::Persistence {
                message: format!("incident {id} missing after write"),
                source: None,
            })?;

        info!(
            incident_id = %stored.id,
            updated_at = %stored.updated_at,
            edit = submission.existing_id.is_some(),
            "incident saved"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use airgi_core::{AttachmentId, Role};

    fn reporter() -> Identity {
        Identity {
            id: UserId("u-1".into()),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            role: Role::User,
        }
    }

    fn record() -> StructuredRecord {
        StructuredRecord {
            title: "Fallo".into(),
            steps_to_reproduce: "1".into(),
            expected_behavior: "a".into(),
            actual_behavior: "b".into(),
            impact: "c".into(),
            environment: None,
            category: Some("UI".into()),
            priority: None,
            reporter_name_hint: "Otro Nombre".into(),
        }
    }

    #[test]
    fn write_strips_binary_handles_and_sets_creation_fields() {
        let key = IncidentId("draft-1".into());
        let who = reporter();
        let rec = record();
        let attachments = vec![Attachment {
            id: AttachmentId("file-1".into()),
            name: "a.png".into(),
            mime_type: "image/png".into(),
            size: 3,
            preview: Some(String::new()),
            content: Some(Arc::from(vec![1u8, 2, 3])),
        }];
        let transcript = vec![ChatTurn::user("hola", attachments.clone())];
        let sub = Submission {
            draft_key: &key,
            existing_id: None,
            original_description: "hola",
            transcript: &transcript,
            record: &rec,
            summary_text: Some("   "),
            attachments: &attachments,
            reporter: &who,
            assignee: None,
        };

        let write = sub.to_write();
        assert_eq!(sub.target(), &key);
        assert_eq!(write.reported_by, Some(UserId("u-1".into())));
        assert_eq!(write.status, Some(IncidentStatus::New));
        assert!(write.summary_text.is_none());
        assert!(write.attachments[0].content.is_none());
        assert!(write.attachments[0].preview.is_none());
        assert!(write.transcript[0].attachments[0].content.is_none());
    }

    #[test]
    fn edit_write_never_carries_reporter_or_status() {
        let key = IncidentId("draft-1".into());
        let existing = IncidentId("inc-9".into());
        let who = reporter();
        let rec = record();
        let sub = Submission {
            draft_key: &key,
            existing_id: Some(&existing),
            original_description: "hola",
            transcript: &[],
            record: &rec,
            summary_text: Some("He preparado el siguiente resumen"),
            attachments: &[],
            reporter: &who,
            assignee: None,
        };

        let write = sub.to_write();
        assert_eq!(sub.target(), &existing);
        assert!(write.reported_by.is_none());
        assert!(write.status.is_none());
        assert!(write.environment.is_none());
        assert_eq!(write.category.as_deref(), Some("UI"));
    }
}
