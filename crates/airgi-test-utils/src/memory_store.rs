// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory incident store with a simulated server clock and injectable
//! failures.
//!
//! Write semantics match the SQLite store: creates are upserts that keep the
//! original reporter, creation time, and status; absent optional fields
//! never blank stored ones; `updated_at` never decreases.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{broadcast, Mutex};

use airgi_core::traits::adapter::PluginAdapter;
use airgi_core::traits::store::IncidentStore;
use airgi_core::types::{
    AdapterType, HealthStatus, Identity, IncidentChange, IncidentId, IncidentStatus,
    IncidentWrite, PersistedIncident, StoredTurn, UserId,
};
use airgi_core::AirgiError;

/// In-memory [`IncidentStore`].
pub struct MemoryIncidentStore {
    incidents: Mutex<HashMap<IncidentId, PersistedIncident>>,
    users: Mutex<BTreeMap<String, Identity>>,
    clock: Mutex<DateTime<Utc>>,
    failing_writes: AtomicUsize,
    failing_reads: AtomicUsize,
    writes: AtomicUsize,
    changes: broadcast::Sender<IncidentChange>,
}

impl MemoryIncidentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        let epoch = Utc
            .with_ymd_and_hms(2026, 1, 1, 9, 0, 0)
            .single()
            .unwrap_or_default();
        Self {
            incidents: Mutex::new(HashMap::new()),
            users: Mutex::new(BTreeMap::new()),
            clock: Mutex::new(epoch),
            failing_writes: AtomicUsize::new(0),
            failing_reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            changes,
        }
    }

    /// Makes the next `n` incident writes fail.
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` incident reads fail.
    pub fn fail_next_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    /// Number of incident writes that reached the store, failed ones excluded.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Places a record as-is, bypassing the clock.
    pub async fn seed(&self, incident: PersistedIncident) {
        self.incidents
            .lock()
            .await
            .insert(incident.id.clone(), incident);
    }

    /// Reads a record without consuming injected read failures.
    pub async fn peek(&self, id: &IncidentId) -> Option<PersistedIncident> {
        self.incidents.lock().await.get(id).cloned()
    }

    /// Advances the simulated server clock by one second and returns it.
    async fn tick(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().await;
        *clock += Duration::seconds(1);
        *clock
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_write(&self) -> Result<(), AirgiError> {
        if Self::take_failure(&self.failing_writes) {
            return Err(AirgiError::Storage {
                source: Box::new(std::io::Error::other("injected write failure")),
            });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn check_read(&self) -> Result<(), AirgiError> {
        if Self::take_failure(&self.failing_reads) {
            return Err(AirgiError::Storage {
                source: Box::new(std::io::Error::other("injected read failure")),
            });
        }
        Ok(())
    }

    fn announce(&self, change: IncidentChange) {
        let _ = self.changes.send(change);
    }
}

impl Default for MemoryIncidentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn turns(write: &IncidentWrite) -> Result<Vec<airgi_core::ChatTurn>, AirgiError> {
    write
        .transcript
        .iter()
        .cloned()
        .map(StoredTurn::into_turn)
        .collect()
}

/// Copies the always-written fields and the present optional ones.
fn apply(target: &mut PersistedIncident, write: &IncidentWrite) -> Result<(), AirgiError> {
    target.title = write.title.clone();
    target.original_description = write.original_description.clone();
    target.transcript = turns(write)?;
    target.steps_to_reproduce = write.steps_to_reproduce.clone();
    target.expected_behavior = write.expected_behavior.clone();
    target.actual_behavior = write.actual_behavior.clone();
    target.impact = write.impact.clone();
    target.attachments = write.attachments.clone();
    if write.summary_text.is_some() {
        target.summary_text = write.summary_text.clone();
    }
    if write.environment.is_some() {
        target.environment = write.environment.clone();
    }
    if write.category.is_some() {
        target.category = write.category.clone();
    }
    if write.priority.is_some() {
        target.priority = write.priority.clone();
    }
    if write.assigned_to.is_some() {
        target.assigned_to = write.assigned_to.clone();
    }
    Ok(())
}

#[async_trait]
impl PluginAdapter for MemoryIncidentStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AirgiError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AirgiError> {
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for MemoryIncidentStore {
    async fn create_incident(
        &self,
        id: &IncidentId,
        write: &IncidentWrite,
    ) -> Result<(), AirgiError> {
        self.check_write()?;
        let now = self.tick().await;
        let mut incidents = self.incidents.lock().await;
        match incidents.get_mut(id) {
            Some(existing) => {
                apply(existing, write)?;
                existing.updated_at = existing.updated_at.max(now);
            }
            None => {
                let reported_by = write.reported_by.clone().ok_or_else(|| {
                    AirgiError::Internal("create without a reporter".into())
                })?;
                let mut fresh = PersistedIncident {
                    id: id.clone(),
                    title: String::new(),
                    original_description: String::new(),
                    transcript: Vec::new(),
                    summary_text: None,
                    steps_to_reproduce: String::new(),
                    expected_behavior: String::new(),
                    actual_behavior: String::new(),
                    impact: String::new(),
                    environment: None,
                    category: None,
                    priority: None,
                    attachments: Vec::new(),
                    reported_by,
                    assigned_to: None,
                    status: write.status.unwrap_or(IncidentStatus::New),
                    created_at: now,
                    updated_at: now,
                };
                apply(&mut fresh, write)?;
                incidents.insert(id.clone(), fresh);
            }
        }
        drop(incidents);
        self.announce(IncidentChange::Created(id.clone()));
        Ok(())
    }

    async fn update_incident(
        &self,
        id: &IncidentId,
        write: &IncidentWrite,
    ) -> Result<(), AirgiError> {
        self.check_write()?;
        let now = self.tick().await;
        let mut incidents = self.incidents.lock().await;
        let existing = incidents.get_mut(id).ok_or_else(|| AirgiError::NotFound {
            collection: "incidents",
            id: id.to_string(),
        })?;
        apply(existing, write)?;
        if let Some(status) = write.status {
            existing.status = status;
        }
        existing.updated_at = existing.updated_at.max(now);
        drop(incidents);
        self.announce(IncidentChange::Updated(id.clone()));
        Ok(())
    }

    async fn get_incident(
        &self,
        id: &IncidentId,
    ) -> Result<Option<PersistedIncident>, AirgiError> {
        self.check_read()?;
        Ok(self.incidents.lock().await.get(id).cloned())
    }

    async fn list_incidents(&self) -> Result<Vec<PersistedIncident>, AirgiError> {
        self.check_read()?;
        let mut all: Vec<_> = self.incidents.lock().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_status(
        &self,
        id: &IncidentId,
        status: IncidentStatus,
    ) -> Result<(), AirgiError> {
        self.check_write()?;
        let now = self.tick().await;
        let mut incidents = self.incidents.lock().await;
        let existing = incidents.get_mut(id).ok_or_else(|| AirgiError::NotFound {
            collection: "incidents",
            id: id.to_string(),
        })?;
        existing.status = status;
        existing.updated_at = existing.updated_at.max(now);
        drop(incidents);
        self.announce(IncidentChange::StatusChanged {
            id: id.clone(),
            status,
        });
        Ok(())
    }

    async fn delete_incident(&self, id: &IncidentId) -> Result<(), AirgiError> {
        self.check_write()?;
        if self.incidents.lock().await.remove(id).is_none() {
            return Err(AirgiError::NotFound {
                collection: "incidents",
                id: id.to_string(),
            });
        }
        self.announce(IncidentChange::Deleted(id.clone()));
        Ok(())
    }

    async fn upsert_user(&self, profile: &Identity) -> Result<(), AirgiError> {
        self.users
            .lock()
            .await
            .insert(profile.id.0.clone(), profile.clone());
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<Identity>, AirgiError> {
        Ok(self.users.lock().await.get(&id.0).cloned())
    }

    async fn list_users(&self) -> Result<Vec<Identity>, AirgiError> {
        let mut users: Vec<_> = self.users.lock().await.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    fn subscribe(&self) -> broadcast::Receiver<IncidentChange> {
        self.changes.subscribe()
    }
}
