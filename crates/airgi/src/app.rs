// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend wiring shared by every subcommand.

use std::sync::Arc;

use airgi_agent::{IncidentDesk, IntakeContext, IntakeSettings};
use airgi_config::AirgiConfig;
use airgi_core::{
    AirgiError, AssistantAdapter, Identity, IdentityProvider, IncidentStore,
};
use airgi_gemini::GeminiAssistant;
use airgi_storage::SqliteIncidentStore;
use tracing::{debug, info};

use crate::identity::ConfigIdentityProvider;

/// Opened store, assistant, and signed-in identity.
pub struct App {
    pub identity: Identity,
    pub store: Arc<dyn IncidentStore>,
    pub context: IntakeContext,
}

impl App {
    /// Opens the store and resolves the identity. The assistant is built
    /// even without an API key; sessions then open as unavailable.
    pub async fn open(config: &AirgiConfig) -> Result<Self, AirgiError> {
        let identity = ConfigIdentityProvider::new(config.identity.clone())
            .current_identity()
            .await?;

        if let Some(parent) = std::path::Path::new(&config.storage.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AirgiError::Storage { source: e.into() })?;
        }
        let store = SqliteIncidentStore::new(config.storage.clone());
        store.initialize().await?;
        let store: Arc<dyn IncidentStore> = Arc::new(store);
        store.upsert_user(&identity).await?;
        debug!(user = %identity.id, "profile synchronized");

        let assistant: Arc<dyn AssistantAdapter> =
            Arc::new(GeminiAssistant::new(&config.assistant)?);
        let context = IntakeContext::new(
            assistant,
            Arc::clone(&store),
            IntakeSettings::from_config(config),
        );
        info!(user = %identity.id, role = %identity.role, "airgi ready");

        Ok(Self {
            identity,
            store,
            context,
        })
    }

    pub fn desk(&self) -> IncidentDesk {
        IncidentDesk::new(Arc::clone(&self.store))
    }
}
