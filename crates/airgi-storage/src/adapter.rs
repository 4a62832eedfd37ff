// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the IncidentStore trait.

use async_trait::async_trait;
use tokio::sync::{broadcast, OnceCell};
use tracing::debug;

use airgi_config::model::StorageConfig;
use airgi_core::types::{
    Identity, IncidentChange, IncidentId, IncidentStatus, IncidentWrite, PersistedIncident,
    UserId,
};
use airgi_core::{AdapterType, AirgiError, HealthStatus, IncidentStore, PluginAdapter};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// Buffered changes per subscriber before it starts lagging.
const CHANGE_FEED_CAPACITY: usize = 64;

/// SQLite-backed incident store.
///
/// The database is lazily opened by [`SqliteIncidentStore::initialize`].
/// Every successful write is announced on a broadcast channel so list views
/// can refresh without polling.
pub struct SqliteIncidentStore {
    config: StorageConfig,
    db: OnceCell<Database>,
    changes: broadcast::Sender<IncidentChange>,
}

impl SqliteIncidentStore {
    /// Create a new store. The database is not opened until [`initialize`](Self::initialize).
    pub fn new(config: StorageConfig) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            config,
            db: OnceCell::new(),
            changes,
        }
    }

    /// Open the database and apply migrations.
    pub async fn initialize(&self) -> Result<(), AirgiError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| AirgiError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite incident store initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, AirgiError> {
        self.db.get().ok_or_else(|| AirgiError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    fn announce(&self, change: IncidentChange) {
        // No receivers is fine.
        let _ = self.changes.send(change);
    }
}

fn not_found(id: &IncidentId) -> AirgiError {
    AirgiError::NotFound {
        collection: "incidents",
        id: id.0.clone(),
    }
}

#[async_trait]
impl PluginAdapter for SqliteIncidentStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AirgiError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AirgiError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl IncidentStore for SqliteIncidentStore {
    async fn create_incident(
        &self,
        id: &IncidentId,
        write: &IncidentWrite,
    ) -> Result<(), AirgiError> {
        queries::incidents::create_incident(self.db()?, id, write).await?;
        debug!(incident_id = %id, "incident written");
        self.announce(IncidentChange::Created(id.clone()));
        Ok(())
    }

    async fn update_incident(
        &self,
        id: &IncidentId,
        write: &IncidentWrite,
    ) -> Result<(), AirgiError> {
        if queries::incidents::update_incident(self.db()?, id, write).await? == 0 {
            return Err(not_found(id));
        }
        debug!(incident_id = %id, "incident updated");
        self.announce(IncidentChange::Updated(id.clone()));
        Ok(())
    }

    async fn get_incident(
        &self,
        id: &IncidentId,
    ) -> Result<Option<PersistedIncident>, AirgiError> {
        queries::incidents::get_incident(self.db()?, id).await
    }

    async fn list_incidents(&self) -> Result<Vec<PersistedIncident>, AirgiError> {
        queries::incidents::list_incidents(self.db()?).await
    }

    async fn update_status(
        &self,
        id: &IncidentId,
        status: IncidentStatus,
    ) -> Result<(), AirgiError> {
        if queries::incidents::update_status(self.db()?, id, status).await? == 0 {
            return Err(not_found(id));
        }
        self.announce(IncidentChange::StatusChanged {
            id: id.clone(),
            status,
        });
        Ok(())
    }

    async fn delete_incident(&self, id: &IncidentId) -> Result<(), AirgiError> {
        if queries::incidents::delete_incident(self.db()?, id).await? == 0 {
            return Err(not_found(id));
        }
        self.announce(IncidentChange::Deleted(id.clone()));
        Ok(())
    }

    async fn upsert_user(&self, profile: &Identity) -> Result<(), AirgiError> {
        queries::users::upsert_user(self.db()?, profile).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<Identity>, AirgiError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn list_users(&self) -> Result<Vec<Identity>, AirgiError> {
        queries::users::list_users(self.db()?).await
    }

    fn subscribe(&self) -> broadcast::Receiver<IncidentChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let store = SqliteIncidentStore::new(make_config(
            dir.path().join("test.db").to_str().unwrap(),
        ));
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let store = SqliteIncidentStore::new(make_config(
            dir.path().join("test.db").to_str().unwrap(),
        ));
        assert!(store.list_incidents().await.is_err());
        assert!(store.health_check().await.is_err());
        // Shutdown without a database is a no-op.
        assert!(store.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let dir = tempdir().unwrap();
        let store = SqliteIncidentStore::new(make_config(
            dir.path().join("test.db").to_str().unwrap(),
        ));
        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.shutdown().await.unwrap();
    }
}
