// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end intake testing.
//!
//! `TestHarness` assembles an intake context around a scripted assistant and
//! either the in-memory store or a temp SQLite database, and hands out
//! controllers wired to it.

use std::sync::Arc;

use airgi_agent::{ConversationController, IncidentDesk, IntakeContext, IntakeSettings};
use airgi_config::model::StorageConfig;
use airgi_core::types::{Identity, PersistedIncident, Role, UserId};
use airgi_core::{AirgiError, AssistantAdapter, IncidentStore};
use airgi_storage::SqliteIncidentStore;

use crate::memory_store::MemoryIncidentStore;
use crate::mock_assistant::{MockAssistant, ScriptedReply};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<ScriptedReply>,
    unavailable: Option<String>,
    sqlite: bool,
    settings: IntakeSettings,
    reporter: Identity,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            unavailable: None,
            sqlite: false,
            settings: IntakeSettings::default(),
            reporter: default_reporter(),
        }
    }

    /// Set scripted assistant replies.
    pub fn with_replies(mut self, replies: Vec<ScriptedReply>) -> Self {
        self.replies = replies;
        self
    }

    /// Set scripted replies that each arrive as a single fragment.
    pub fn with_texts(mut self, texts: &[&str]) -> Self {
        self.replies = texts.iter().map(|t| ScriptedReply::text(*t)).collect();
        self
    }

    /// Make every session open fail as unavailable.
    pub fn with_unavailable_assistant(mut self, reason: &str) -> Self {
        self.unavailable = Some(reason.to_string());
        self
    }

    /// Back the intake with a temp SQLite database instead of memory.
    pub fn with_sqlite_store(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub fn with_settings(mut self, settings: IntakeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_reporter(mut self, reporter: Identity) -> Self {
        self.reporter = reporter;
        self
    }

    /// Build the test harness, creating all required backends.
    pub async fn build(self) -> Result<TestHarness, AirgiError> {
        let assistant = Arc::new(match self.unavailable {
            Some(reason) => MockAssistant::unavailable(reason),
            None => MockAssistant::with_replies(self.replies),
        });

        let (store, memory, temp_dir) = if self.sqlite {
            let temp_dir =
                tempfile::TempDir::new().map_err(|e| AirgiError::Storage { source: e.into() })?;
            let db_path = temp_dir.path().join("test.db");
            let sqlite = SqliteIncidentStore::new(StorageConfig {
                database_path: db_path.to_string_lossy().to_string(),
                wal_mode: true,
            });
            sqlite.initialize().await?;
            (Arc::new(sqlite) as Arc<dyn IncidentStore>, None, Some(temp_dir))
        } else {
            let memory = Arc::new(MemoryIncidentStore::new());
            (Arc::clone(&memory) as Arc<dyn IncidentStore>, Some(memory), None)
        };

        store.upsert_user(&self.reporter).await?;

        let context = IntakeContext::new(
            Arc::clone(&assistant) as Arc<dyn AssistantAdapter>,
            Arc::clone(&store),
            self.settings,
        );

        Ok(TestHarness {
            assistant,
            store,
            memory,
            context,
            reporter: self.reporter,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete intake environment with mock backends.
pub struct TestHarness {
    /// The scripted assistant.
    pub assistant: Arc<MockAssistant>,
    /// The store every controller writes to.
    pub store: Arc<dyn IncidentStore>,
    /// Set when the store is the in-memory one, for failure injection.
    pub memory: Option<Arc<MemoryIncidentStore>>,
    pub context: IntakeContext,
    /// Signed-in identity used for new controllers.
    pub reporter: Identity,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The in-memory store, unless the harness is SQLite-backed.
    pub fn memory(&self) -> Option<&MemoryIncidentStore> {
        self.memory.as_deref()
    }

    /// A controller for a new report, not yet initialized.
    pub fn new_report(&self, description: &str) -> ConversationController {
        ConversationController::start_new(&self.context, self.reporter.clone(), description)
    }

    /// A controller re-opening `incident` as the harness reporter.
    pub fn reopen(&self, incident: &PersistedIncident) -> ConversationController {
        ConversationController::reopen(&self.context, self.reporter.clone(), incident)
    }

    pub fn desk(&self) -> IncidentDesk {
        IncidentDesk::new(Arc::clone(&self.store))
    }
}

/// The identity a harness reports as unless told otherwise.
pub fn default_reporter() -> Identity {
    Identity {
        id: UserId("u-ana".into()),
        name: "Ana Pérez".into(),
        email: "ana@example.com".into(),
        role: Role::User,
    }
}

/// A summary reply carrying every field the parser recognizes.
pub fn full_summary_reply() -> String {
    "He preparado el siguiente resumen del problema. Por favor, revísalo.\n\
     TituloSugerido: La factura no se exporta\n\
     PasosParaReproducir: 1. Abrir facturas 2. Pulsar Exportar\n\
     ComportamientoEsperado: Se descarga un PDF\n\
     ComportamientoActual: Aparece el error E-42\n\
     ImpactoDelProblema: No se puede cerrar el mes\n\
     EntornoPotencial: Chrome 126 en Windows 11\n\
     CategoriaSugerida: Funcionalidad\n\
     PrioridadSugerida: Alta\n\
     NombreDelReportador: Ana Pérez"
        .to_string()
}
