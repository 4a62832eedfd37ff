// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incident management outside an intake session: listing, status changes,
//! deletion, and the shareable digest of a saved incident.

use std::sync::Arc;

use airgi_core::{
    AirgiError, Identity, IncidentId, IncidentStatus, IncidentStore, PersistedIncident, UserId,
};
use tracing::info;

/// Which incidents a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Incidents the viewer reported. Admins see every incident.
    Reported,
    /// Incidents assigned to the viewer.
    Received,
}

/// Optional narrowing of a listing.
#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub status: Option<IncidentStatus>,
    /// Case-insensitive match against id, title, description, category,
    /// reporter, and assignee.
    pub term: Option<String>,
}

impl IncidentFilter {
    fn matches(&self, incident: &PersistedIncident, users: &[Identity]) -> bool {
        if let Some(status) = self.status
            && incident.status != status
        {
            return false;
        }
        let Some(term) = self.term.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        let reporter = display_name(&incident.reported_by, users);
        let assignee = incident
            .assigned_to
            .as_ref()
            .map(|id| display_name(id, users))
            .unwrap_or_default();
        [
            incident.id.0.as_str(),
            incident.title.as_str(),
            incident.original_description.as_str(),
            incident.category.as_deref().unwrap_or_default(),
            incident.reported_by.0.as_str(),
            reporter.as_str(),
            assignee.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Reported incidents are editable and deletable by admins and their reporter.
pub fn can_manage(viewer: &Identity, incident: &PersistedIncident) -> bool {
    viewer.is_admin() || incident.reported_by == viewer.id
}

/// Status may also be moved by whoever the incident is assigned to.
pub fn can_change_status(viewer: &Identity, incident: &PersistedIncident) -> bool {
    can_manage(viewer, incident) || incident.assigned_to.as_ref() == Some(&viewer.id)
}

fn display_name(id: &UserId, users: &[Identity]) -> String {
    users
        .iter()
        .find(|u| &u.id == id)
        .map(|u| u.name.clone())
        .unwrap_or_else(|| id.0.clone())
}

/// Store-backed incident operations with ownership checks.
#[derive(Clone)]
pub struct IncidentDesk {
    store: Arc<dyn IncidentStore>,
}

impl IncidentDesk {
    pub fn new(store: Arc<dyn IncidentStore>) -> Self {
        Self { store }
    }

    /// Lists incidents for `viewer`, newest first.
    pub async fn list(
        &self,
        viewer: &Identity,
        listing: Listing,
        filter: &IncidentFilter,
    ) -> Result<Vec<PersistedIncident>, AirgiError> {
        let users = self.store.list_users().await?;
        let incidents = self.store.list_incidents().await?;
        Ok(incidents
            .into_iter()
            .filter(|inc| match listing {
                Listing::Reported => viewer.is_admin() || inc.reported_by == viewer.id,
                Listing::Received => inc.assigned_to.as_ref() == Some(&viewer.id),
            })
            .filter(|inc| filter.matches(inc, &users))
            .collect())
    }

    async fn fetch(&self, id: &IncidentId) -> Result<PersistedIncident, AirgiError> {
        self.store
            .get_incident(id)
            .await?
            .ok_or_else(|| AirgiError::NotFound {
                collection: "incidents",
                id: id.to_string(),
            })
    }

    /// Loads an incident for re-opening in an intake session.
    pub async fn open_for_edit(
        &self,
        viewer: &Identity,
        id: &IncidentId,
    ) -> Result<PersistedIncident, AirgiError> {
        let incident = self.fetch(id).await?;
        if !can_manage(viewer, &incident) {
            return Err(AirgiError::Unauthorized(format!(
                "{} may not edit incident {id}",
                viewer.id
            )));
        }
        Ok(incident)
    }

    pub async fn update_status(
        &self,
        viewer: &Identity,
        id: &IncidentId,
        status: IncidentStatus,
    ) -> Result<(), AirgiError> {
        let incident = self.fetch(id).await?;
        if !can_change_status(viewer, &incident) {
            return Err(AirgiError::Unauthorized(format!(
                "{} may not change the status of incident {id}",
                viewer.id
            )));
        }
        self.store.update_status(id, status).await?;
        info!(incident_id = %id, %status, by = %viewer.id, "incident status changed");
        Ok(())
    }

    pub async fn delete(&self, viewer: &Identity, id: &IncidentId) -> Result<(), AirgiError> {
        let incident = self.fetch(id).await?;
        if !can_manage(viewer, &incident) {
            return Err(AirgiError::Unauthorized(format!(
                "{} may not delete incident {id}",
                viewer.id
            )));
        }
        self.store.delete_incident(id).await?;
        info!(incident_id = %id, by = %viewer.id, "incident deleted");
        Ok(())
    }

    /// Digest of a saved incident for pasting into a team chat.
    pub async fn share_message(&self, incident: &PersistedIncident) -> Result<String, AirgiError> {
        let users = self.store.list_users().await?;
        Ok(share_message(incident, &users))
    }
}

/// Renders the chat digest of `incident`, resolving user names from `users`.
pub fn share_message(incident: &PersistedIncident, users: &[Identity]) -> String {
    let short_id: String = incident.id.0.chars().take(8).collect();
    let assignee = incident
        .assigned_to
        .as_ref()
        .map(|id| display_name(id, users))
        .unwrap_or_else(|| "N/A".into());

    let mut out = format!(
        "*Nueva Incidencia Reportada en AIRGI*\n\
         *ID:* {short_id}...\n\
         *Título:* {}\n\
         *Reportado por:* {}\n\
         *Asignado a:* {assignee}\n\
         *Estado:* {}\n\
         *Prioridad IA:* {}\n\
         *Resumen IA:*\n\
         > *Pasos:* {}\n\
         > *Esperado:* {}\n\
         > *Actual:* {}\n\
         > *Impacto:* {}\n",
        incident.title,
        display_name(&incident.reported_by, users),
        incident.status.label(),
        incident.priority.as_deref().unwrap_or("N/A"),
        incident.steps_to_reproduce,
        incident.expected_behavior,
        incident.actual_behavior,
        incident.impact,
    );
    if !incident.attachments.is_empty() {
        out.push_str(&format!(
            "*Adjuntos:* {} archivo(s)\n",
            incident.attachments.len()
        ));
    }
    out.push_str("Puedes ver más detalles en la aplicación AIRGI.");
    out
}
