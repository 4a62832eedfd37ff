// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Non-interactive incident commands: list, status, delete, share.

use airgi_agent::{IncidentFilter, Listing};
use airgi_core::{AirgiError, IncidentId, IncidentStatus, PersistedIncident};
use colored::Colorize;

use crate::app::App;

pub async fn list(app: &App, listing: Listing, filter: IncidentFilter) -> Result<(), AirgiError> {
    let incidents = app.desk().list(&app.identity, listing, &filter).await?;
    if incidents.is_empty() {
        println!("{}", "No hay incidencias.".dimmed());
        return Ok(());
    }
    for incident in &incidents {
        println!("{}", row(incident));
    }
    println!("{}", format!("{} incidencia(s)", incidents.len()).dimmed());
    Ok(())
}

fn row(incident: &PersistedIncident) -> String {
    let status = match incident.status {
        IncidentStatus::New => incident.status.label().blue(),
        IncidentStatus::InProgress => incident.status.label().yellow(),
        IncidentStatus::PendingInfo => incident.status.label().magenta(),
        IncidentStatus::Resolved | IncidentStatus::Closed => incident.status.label().green(),
    };
    format!(
        "{}  {}  {:<24}  {}  {}",
        incident.id.to_string().cyan(),
        incident.created_at.format("%Y-%m-%d %H:%M"),
        status,
        incident.priority.as_deref().unwrap_or("-"),
        incident.title
    )
}

pub async fn set_status(app: &App, id: &IncidentId, status: IncidentStatus) -> Result<(), AirgiError> {
    app.desk().update_status(&app.identity, id, status).await?;
    println!("{} {id} -> {}", "Estado actualizado:".green(), status.label());
    Ok(())
}

pub async fn delete(app: &App, id: &IncidentId) -> Result<(), AirgiError> {
    app.desk().delete(&app.identity, id).await?;
    println!("{} {id}", "Incidencia eliminada:".green());
    Ok(())
}

pub async fn share(app: &App, id: &IncidentId) -> Result<(), AirgiError> {
    let incident = app
        .store
        .get_incident(id)
        .await?
        .ok_or_else(|| AirgiError::NotFound {
            collection: "incidents",
            id: id.to_string(),
        })?;
    println!("{}", app.desk().share_message(&incident).await?);
    Ok(())
}
