// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document store trait for incidents and user profiles.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::AirgiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Identity, IncidentChange, IncidentId, IncidentStatus, IncidentWrite, PersistedIncident,
    UserId,
};

/// Persists incidents and user profiles with server-authoritative times.
///
/// Writers never trust their own clock: `created_at` and `updated_at` are
/// resolved by the store, and callers re-read after writing to learn them.
#[async_trait]
pub trait IncidentStore: PluginAdapter {
    /// Writes a new incident under `id`, resolving both timestamps.
    ///
    /// Writing again under the same id keeps the original `created_at`,
    /// `reported_by`, and `status`, so a retried creation never duplicates.
    async fn create_incident(
        &self,
        id: &IncidentId,
        write: &IncidentWrite,
    ) -> Result<(), AirgiError>;

    /// Writes the changed fields of an existing incident, resolving only
    /// `updated_at`. Absent optional fields keep their stored values.
    async fn update_incident(
        &self,
        id: &IncidentId,
        write: &IncidentWrite,
    ) -> Result<(), AirgiError>;

    async fn get_incident(&self, id: &IncidentId)
        -> Result<Option<PersistedIncident>, AirgiError>;

    /// All incidents, newest first.
    async fn list_incidents(&self) -> Result<Vec<PersistedIncident>, AirgiError>;

    async fn update_status(
        &self,
        id: &IncidentId,
        status: IncidentStatus,
    ) -> Result<(), AirgiError>;

    async fn delete_incident(&self, id: &IncidentId) -> Result<(), AirgiError>;

    async fn upsert_user(&self, profile: &Identity) -> Result<(), AirgiError>;

    async fn get_user(&self, id: &UserId) -> Result<Option<Identity>, AirgiError>;

    async fn list_users(&self) -> Result<Vec<Identity>, AirgiError>;

    /// Live feed of incident changes made through this store.
    fn subscribe(&self) -> broadcast::Receiver<IncidentChange>;
}
