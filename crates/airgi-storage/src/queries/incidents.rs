// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incident CRUD operations.
//!
//! Timestamps are always resolved by SQLite itself, never taken from the
//! caller. `updated_at` is written as the max of the stored and current
//! value so it cannot move backwards.

use std::str::FromStr;

use airgi_core::types::{
    Attachment, IncidentId, IncidentStatus, IncidentWrite, PersistedIncident, StoredTurn, UserId,
};
use airgi_core::{normalize_timestamp, AirgiError, RawTimestamp};
use rusqlite::params;

use crate::database::{map_tr_err, Database};

const SELECT_COLUMNS: &str = "SELECT id, title, original_description, transcript, summary_text,
            steps_to_reproduce, expected_behavior, actual_behavior, impact,
            environment, category, priority, attachments, reported_by, assigned_to,
            status, created_at, updated_at
     FROM incidents";

/// Owned, SQL-ready values of an [`IncidentWrite`].
struct WriteParams {
    title: String,
    original_description: String,
    transcript: String,
    summary_text: Option<String>,
    steps_to_reproduce: String,
    expected_behavior: String,
    actual_behavior: String,
    impact: String,
    environment: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    attachments: String,
    assigned_to: Option<String>,
    status: Option<String>,
}

impl WriteParams {
    fn from_write(write: &IncidentWrite) -> Result<Self, AirgiError> {
        Ok(Self {
            title: write.title.clone(),
            original_description: write.original_description.clone(),
            transcript: to_json(&write.transcript)?,
            summary_text: write.summary_text.clone(),
            steps_to_reproduce: write.steps_to_reproduce.clone(),
            expected_behavior: write.expected_behavior.clone(),
            actual_behavior: write.actual_behavior.clone(),
            impact: write.impact.clone(),
            environment: write.environment.clone(),
            category: write.category.clone(),
            priority: write.priority.clone(),
            attachments: to_json(&write.attachments)?,
            assigned_to: write.assigned_to.as_ref().map(|u| u.0.clone()),
            status: write.status.map(|s| s.to_string()),
        })
    }
}

/// Raw row as read from SQLite, before JSON and time decoding.
struct IncidentRow {
    id: String,
    title: String,
    original_description: String,
    transcript: String,
    summary_text: Option<String>,
    steps_to_reproduce: String,
    expected_behavior: String,
    actual_behavior: String,
    impact: String,
    environment: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    attachments: String,
    reported_by: String,
    assigned_to: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl IncidentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            original_description: row.get(2)?,
            transcript: row.get(3)?,
            summary_text: row.get(4)?,
            steps_to_reproduce: row.get(5)?,
            expected_behavior: row.get(6)?,
            actual_behavior: row.get(7)?,
            impact: row.get(8)?,
            environment: row.get(9)?,
            category: row.get(10)?,
            priority: row.get(11)?,
            attachments: row.get(12)?,
            reported_by: row.get(13)?,
            assigned_to: row.get(14)?,
            status: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    fn into_incident(self) -> Result<PersistedIncident, AirgiError> {
        let stored: Vec<StoredTurn> = from_json(&self.transcript)?;
        let transcript = stored
            .into_iter()
            .map(StoredTurn::into_turn)
            .collect::<Result<Vec<_>, _>>()?;
        let attachments: Vec<Attachment> = from_json(&self.attachments)?;
        let status = IncidentStatus::from_str(&self.status).map_err(|e| AirgiError::Storage {
            source: format!("bad status `{}` on incident {}: {e}", self.status, self.id).into(),
        })?;

        Ok(PersistedIncident {
            id: IncidentId(self.id),
            title: self.title,
            original_description: self.original_description,
            transcript,
            summary_text: self.summary_text,
            steps_to_reproduce: self.steps_to_reproduce,
            expected_behavior: self.expected_behavior,
            actual_behavior: self.actual_behavior,
            impact: self.impact,
            environment: self.environment,
            category: self.category,
            priority: self.priority,
            attachments,
            reported_by: UserId(self.reported_by),
            assigned_to: self.assigned_to.map(UserId),
            status,
            created_at: normalize_timestamp(RawTimestamp::Text(self.created_at))?,
            updated_at: normalize_timestamp(RawTimestamp::Text(self.updated_at))?,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AirgiError> {
    serde_json::to_string(value).map_err(|e| AirgiError::Storage {
        source: Box::new(e),
    })
}

fn from_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, AirgiError> {
    serde_json::from_str(text).map_err(|e| AirgiError::Storage {
        source: Box::new(e),
    })
}

/// Insert an incident, or refresh it if `id` already exists.
///
/// On conflict the original `created_at`, `reported_by`, and `status` stay.
pub async fn create_incident(
    db: &Database,
    id: &IncidentId,
    write: &IncidentWrite,
) -> Result<(), AirgiError> {
    let reported_by = write
        .reported_by
        .as_ref()
        .map(|u| u.0.clone())
        .ok_or_else(|| AirgiError::Internal("creating an incident requires reported_by".into()))?;
    let status = write.status.unwrap_or(IncidentStatus::New).to_string();
    let p = WriteParams::from_write(write)?;
    let id = id.0.clone();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO incidents (id, title, original_description, transcript, summary_text,
                     steps_to_reproduce, expected_behavior, actual_behavior, impact,
                     environment, category, priority, attachments, reported_by, assigned_to,
                     status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     original_description = excluded.original_description,
                     transcript = excluded.transcript,
                     summary_text = COALESCE(excluded.summary_text, incidents.summary_text),
                     steps_to_reproduce = excluded.steps_to_reproduce,
                     expected_behavior = excluded.expected_behavior,
                     actual_behavior = excluded.actual_behavior,
                     impact = excluded.impact,
                     environment = COALESCE(excluded.environment, incidents.environment),
                     category = COALESCE(excluded.category, incidents.category),
                     priority = COALESCE(excluded.priority, incidents.priority),
                     attachments = excluded.attachments,
                     assigned_to = COALESCE(excluded.assigned_to, incidents.assigned_to),
                     updated_at = MAX(incidents.updated_at, excluded.updated_at)",
                params![
                    id,
                    p.title,
                    p.original_description,
                    p.transcript,
                    p.summary_text,
                    p.steps_to_reproduce,
                    p.expected_behavior,
                    p.actual_behavior,
                    p.impact,
                    p.environment,
                    p.category,
                    p.priority,
                    p.attachments,
                    reported_by,
                    p.assigned_to,
                    status,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Update the changed fields of an incident. Returns the number of rows hit.
///
/// `reported_by` and `created_at` are never touched.
pub async fn update_incident(
    db: &Database,
    id: &IncidentId,
    write: &IncidentWrite,
) -> Result<usize, AirgiError> {
    let p = WriteParams::from_write(write)?;
    let id = id.0.clone();

    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE incidents SET
                     title = ?2,
                     original_description = ?3,
                     transcript = ?4,
                     summary_text = COALESCE(?5, summary_text),
                     steps_to_reproduce = ?6,
                     expected_behavior = ?7,
                     actual_behavior = ?8,
                     impact = ?9,
                     environment = COALESCE(?10, environment),
                     category = COALESCE(?11, category),
                     priority = COALESCE(?12, priority),
                     attachments = ?13,
                     assigned_to = COALESCE(?14, assigned_to),
                     status = COALESCE(?15, status),
                     updated_at = MAX(updated_at, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 WHERE id = ?1",
                params![
                    id,
                    p.title,
                    p.original_description,
                    p.transcript,
                    p.summary_text,
                    p.steps_to_reproduce,
                    p.expected_behavior,
                    p.actual_behavior,
                    p.impact,
                    p.environment,
                    p.category,
                    p.priority,
                    p.attachments,
                    p.assigned_to,
                    p.status,
                ],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Get an incident by ID.
pub async fn get_incident(
    db: &Database,
    id: &IncidentId,
) -> Result<Option<PersistedIncident>, AirgiError> {
    let id = id.0.clone();
    let row = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            match stmt.query_row(params![id], IncidentRow::from_row) {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    row.map(IncidentRow::into_incident).transpose()
}

/// List all incidents, newest first.
pub async fn list_incidents(db: &Database) -> Result<Vec<PersistedIncident>, AirgiError> {
    let rows = db
        .connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC"))?;
            let rows = stmt.query_map([], IncidentRow::from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    rows.into_iter().map(IncidentRow::into_incident).collect()
}

/// Set an incident's status. Returns the number of rows hit.
pub async fn update_status(
    db: &Database,
    id: &IncidentId,
    status: IncidentStatus,
) -> Result<usize, AirgiError> {
    let id = id.0.clone();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE incidents SET status = ?1,
                     updated_at = MAX(updated_at, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 WHERE id = ?2",
                params![status, id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete an incident. Returns the number of rows hit.
pub async fn delete_incident(db: &Database, id: &IncidentId) -> Result<usize, AirgiError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM incidents WHERE id = ?1", params![id])?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}
