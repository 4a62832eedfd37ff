// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validation and tracking of files offered for the next turn.
//!
//! Accepted files get an [`AttachmentId`] immediately. Image previews are
//! encoded on blocking tasks and merged back by id once they finish, so a
//! slow preview never holds up acceptance, removal, or the turn itself.

use std::sync::Arc;

use airgi_config::model::IntakeConfig;
use airgi_core::{AirgiError, Attachment, AttachmentId, AttachmentRejection, RejectionReason};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Type and size limits applied to every offered file.
#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl AttachmentPolicy {
    pub fn from_config(config: &IntakeConfig) -> Self {
        Self {
            max_bytes: config.max_attachment_bytes,
            allowed_mime_types: config.allowed_mime_types.clone(),
        }
    }

    /// Checks one file. Size must not exceed the maximum; equal is fine.
    pub fn check(&self, file: &OfferedFile) -> Result<(), RejectionReason> {
        if !self
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&file.mime_type))
        {
            return Err(RejectionReason::DisallowedType(file.mime_type.clone()));
        }
        let size = file.size();
        if size > self.max_bytes {
            return Err(RejectionReason::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::from_config(&IntakeConfig::default())
    }
}

/// A file as handed over by the user, before validation.
#[derive(Debug, Clone)]
pub struct OfferedFile {
    pub name: String,
    pub mime_type: String,
    pub content: Arc<[u8]>,
}

impl OfferedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content: Arc::from(content),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Pending attachments for the turn being composed.
pub struct AttachmentManager {
    policy: AttachmentPolicy,
    pending: Vec<Attachment>,
    previews: JoinSet<(AttachmentId, String)>,
}

impl AttachmentManager {
    pub fn new(policy: AttachmentPolicy) -> Self {
        Self {
            policy,
            pending: Vec::new(),
            previews: JoinSet::new(),
        }
    }

    /// Validates a batch and keeps every file that passes.
    ///
    /// Returns the ids of the accepted files, or a single
    /// [`AirgiError::Validation`] listing the rejected ones. Accepted files
    /// stay pending in both cases. Must be called inside a tokio runtime.
    pub fn offer(&mut self, batch: Vec<OfferedFile>) -> Result<Vec<AttachmentId>, AirgiError> {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for file in batch {
            if let Err(reason) = self.policy.check(&file) {
                debug!(name = %file.name, ?reason, "attachment rejected");
                rejected.push(AttachmentRejection {
                    name: file.name,
                    reason,
                });
                continue;
            }
            accepted.push(self.accept(file));
        }

        if rejected.is_empty() {
            Ok(accepted)
        } else {
            warn!(
                accepted = accepted.len(),
                rejected = rejected.len(),
                "attachment batch partially rejected"
            );
            Err(AirgiError::Validation(rejected))
        }
    }

    /// Offers a pasted batch. Non-image entries are ignored rather than rejected.
    pub fn offer_pasted(
        &mut self,
        batch: Vec<OfferedFile>,
    ) -> Result<Vec<AttachmentId>, AirgiError> {
        self.offer(batch.into_iter().filter(OfferedFile::is_image).collect())
    }

    fn accept(&mut self, file: OfferedFile) -> AttachmentId {
        let id = AttachmentId::generate();
        if file.is_image() {
            let task_id = id.clone();
            let mime = file.mime_type.clone();
            let bytes = Arc::clone(&file.content);
            self.previews.spawn_blocking(move || {
                let preview = format!("data:{mime};base64,{}", STANDARD.encode(&bytes));
                (task_id, preview)
            });
        }
        self.pending.push(Attachment {
            id: id.clone(),
            name: file.name,
            mime_type: file.mime_type,
            size: file.content.len() as u64,
            preview: None,
            content: Some(file.content),
        });
        id
    }

    /// Removes a pending attachment. Returns whether it was pending.
    pub fn remove(&mut self, id: &AttachmentId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|att| &att.id != id);
        before != self.pending.len()
    }

    pub fn pending(&self) -> &[Attachment] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Merges every preview that has already finished, without waiting.
    pub fn apply_ready_previews(&mut self) -> usize {
        let mut merged = 0;
        while let Some(joined) = self.previews.try_join_next() {
            merged += usize::from(self.merge(joined));
        }
        merged
    }

    /// Waits for every outstanding preview and merges it.
    pub async fn settle_previews(&mut self) -> usize {
        let mut merged = 0;
        while let Some(joined) = self.previews.join_next().await {
            merged += usize::from(self.merge(joined));
        }
        merged
    }

    fn merge(&mut self, joined: Result<(AttachmentId, String), tokio::task::JoinError>) -> bool {
        let (id, preview) = match joined {
            Ok(done) => done,
            Err(e) => {
                warn!(error = %e, "preview task failed");
                return false;
            }
        };
        match self.pending.iter_mut().find(|att| att.id == id) {
            Some(att) => {
                att.preview = Some(preview);
                true
            }
            None => {
                debug!(%id, "preview for removed attachment dropped");
                false
            }
        }
    }

    /// Hands every pending attachment to the outgoing turn and clears the list.
    pub fn take_for_send(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.pending)
    }
}
