// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite incident store.

use airgi_config::model::StorageConfig;
use airgi_core::types::{
    Attachment, AttachmentId, ChatTurn, Identity, IncidentChange, IncidentId, IncidentStatus,
    IncidentWrite, Role, StoredTurn, UserId,
};
use airgi_core::{AirgiError, IncidentStore};
use airgi_storage::SqliteIncidentStore;
use tempfile::TempDir;

async fn open_store() -> (TempDir, SqliteIncidentStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let store = SqliteIncidentStore::new(StorageConfig {
        database_path: path.to_str().unwrap().to_string(),
        wal_mode: true,
    });
    store.initialize().await.unwrap();
    (dir, store)
}

fn write(title: &str) -> IncidentWrite {
    let transcript = vec![
        ChatTurn::user("La app falla al guardar", Vec::new()),
        ChatTurn::assistant("¿Qué navegador usas?"),
    ];
    IncidentWrite {
        title: title.to_string(),
        original_description: "La app falla al guardar".into(),
        transcript: transcript.iter().map(StoredTurn::from_turn).collect(),
        summary_text: Some("He preparado el siguiente resumen".into()),
        steps_to_reproduce: "1. Abrir. 2. Guardar.".into(),
        expected_behavior: "Se guarda".into(),
        actual_behavior: "Error 500".into(),
        impact: "Alto".into(),
        environment: Some("Chrome".into()),
        category: None,
        priority: Some("Alta".into()),
        attachments: vec![Attachment {
            id: AttachmentId("file-1".into()),
            name: "captura.png".into(),
            mime_type: "image/png".into(),
            size: 2048,
            preview: Some("data:image/png;base64,AAAA".into()),
            content: None,
        }],
        reported_by: Some(UserId("u-1".into())),
        assigned_to: None,
        status: Some(IncidentStatus::New),
    }
}

#[tokio::test]
async fn create_then_reread_returns_server_times() {
    let (_dir, store) = open_store().await;
    let id = IncidentId("inc-1".into());
    let w = write("Fallo al guardar");

    store.create_incident(&id, &w).await.unwrap();
    let stored = store.get_incident(&id).await.unwrap().expect("persisted");

    assert_eq!(stored.title, "Fallo al guardar");
    assert_eq!(stored.reported_by, UserId("u-1".into()));
    assert_eq!(stored.status, IncidentStatus::New);
    assert_eq!(stored.transcript.len(), 2);
    assert_eq!(stored.transcript[0].text, "La app falla al guardar");
    assert_eq!(stored.attachments.len(), 1);
    assert!(stored.attachments[0].content.is_none());
    assert_eq!(stored.created_at, stored.updated_at);
    assert!(stored.category.is_none());
}

#[tokio::test]
async fn retried_create_keeps_the_original_record() {
    let (_dir, store) = open_store().await;
    let id = IncidentId("inc-retry".into());

    store.create_incident(&id, &write("Primero")).await.unwrap();
    let first = store.get_incident(&id).await.unwrap().unwrap();

    let mut retry = write("Segundo");
    retry.reported_by = Some(UserId("someone-else".into()));
    retry.status = Some(IncidentStatus::Closed);
    store.create_incident(&id, &retry).await.unwrap();

    let all = store.list_incidents().await.unwrap();
    assert_eq!(all.len(), 1, "a retried create must not duplicate");
    let second = &all[0];
    assert_eq!(second.title, "Segundo");
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.reported_by, first.reported_by);
    assert_eq!(second.status, IncidentStatus::New);
    assert!(second.updated_at >= first.updated_at);
}

#[tokio::test]
async fn update_preserves_reporter_creation_time_and_absent_optionals() {
    let (_dir, store) = open_store().await;
    let id = IncidentId("inc-2".into());
    store.create_incident(&id, &write("Original")).await.unwrap();
    let before = store.get_incident(&id).await.unwrap().unwrap();

    let mut edit = write("Editado");
    edit.reported_by = None;
    edit.status = None;
    edit.environment = None;
    edit.summary_text = None;
    edit.assigned_to = Some(UserId("admin-1".into()));
    store.update_incident(&id, &edit).await.unwrap();

    let after = store.get_incident(&id).await.unwrap().unwrap();
    assert_eq!(after.title, "Editado");
    assert_eq!(after.reported_by, before.reported_by);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at);
    assert_eq!(after.environment.as_deref(), Some("Chrome"));
    assert_eq!(after.summary_text, before.summary_text);
    assert_eq!(after.assigned_to, Some(UserId("admin-1".into())));
    assert_eq!(after.status, IncidentStatus::New);
}

#[tokio::test]
async fn update_of_missing_incident_is_not_found() {
    let (_dir, store) = open_store().await;
    let err = store
        .update_incident(&IncidentId("ghost".into()), &write("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, AirgiError::NotFound { collection: "incidents", .. }));
}

#[tokio::test]
async fn status_change_and_delete() {
    let (_dir, store) = open_store().await;
    let id = IncidentId("inc-3".into());
    store.create_incident(&id, &write("Estado")).await.unwrap();

    store
        .update_status(&id, IncidentStatus::InProgress)
        .await
        .unwrap();
    let stored = store.get_incident(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, IncidentStatus::InProgress);

    store.delete_incident(&id).await.unwrap();
    assert!(store.get_incident(&id).await.unwrap().is_none());
    assert!(matches!(
        store.delete_incident(&id).await,
        Err(AirgiError::NotFound { .. })
    ));
    assert!(matches!(
        store.update_status(&id, IncidentStatus::Closed).await,
        Err(AirgiError::NotFound { .. })
    ));
}

#[tokio::test]
async fn list_is_newest_first() {
    let (_dir, store) = open_store().await;
    for n in 0..3 {
        let id = IncidentId(format!("inc-{n}"));
        store.create_incident(&id, &write(&format!("t{n}"))).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    let titles: Vec<String> = store
        .list_incidents()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.title)
        .collect();
    assert_eq!(titles, vec!["t2", "t1", "t0"]);
}

#[tokio::test]
async fn users_round_trip() {
    let (_dir, store) = open_store().await;
    let mut ana = Identity {
        id: UserId("u-1".into()),
        name: "Ana".into(),
        email: "ana@example.com".into(),
        role: Role::User,
    };
    store.upsert_user(&ana).await.unwrap();
    ana.role = Role::Admin;
    store.upsert_user(&ana).await.unwrap();

    assert_eq!(store.get_user(&ana.id).await.unwrap(), Some(ana.clone()));
    assert!(store.get_user(&UserId("nobody".into())).await.unwrap().is_none());
    assert_eq!(store.list_users().await.unwrap(), vec![ana]);
}

#[tokio::test]
async fn subscribers_see_changes() {
    let (_dir, store) = open_store().await;
    let mut feed = store.subscribe();
    let id = IncidentId("inc-live".into());

    store.create_incident(&id, &write("Vivo")).await.unwrap();
    store
        .update_status(&id, IncidentStatus::Resolved)
        .await
        .unwrap();
    store.delete_incident(&id).await.unwrap();

    assert_eq!(feed.recv().await.unwrap(), IncidentChange::Created(id.clone()));
    assert_eq!(
        feed.recv().await.unwrap(),
        IncidentChange::StatusChanged {
            id: id.clone(),
            status: IncidentStatus::Resolved
        }
    );
    assert_eq!(feed.recv().await.unwrap(), IncidentChange::Deleted(id));
}
