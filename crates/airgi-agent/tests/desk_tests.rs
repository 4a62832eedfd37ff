// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incident desk operations against a seeded in-memory store.

use chrono::{Duration, TimeZone, Utc};

use airgi_agent::{IncidentFilter, Listing};
use airgi_core::{
    AirgiError, Identity, IncidentId, IncidentStatus, PersistedIncident, Role, UserId,
};
use airgi_test_utils::{default_reporter, TestHarness};

fn person(id: &str, name: &str, role: Role) -> Identity {
    Identity {
        id: UserId(id.into()),
        name: name.into(),
        email: format!("{id}@example.com"),
        role,
    }
}

fn incident(id: &str, title: &str, reporter: &str, assignee: Option<&str>, age_h: i64) -> PersistedIncident {
    let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let at = base - Duration::hours(age_h);
    PersistedIncident {
        id: IncidentId(id.into()),
        title: title.into(),
        original_description: format!("{title} desde esta mañana"),
        transcript: Vec::new(),
        summary_text: None,
        steps_to_reproduce: "1. Entrar".into(),
        expected_behavior: "Funciona".into(),
        actual_behavior: "Falla".into(),
        impact: "Alto".into(),
        environment: None,
        category: Some("Funcionalidad".into()),
        priority: Some("Alta".into()),
        attachments: Vec::new(),
        reported_by: UserId(reporter.into()),
        assigned_to: assignee.map(|a| UserId(a.into())),
        status: IncidentStatus::New,
        created_at: at,
        updated_at: at,
    }
}

async fn seeded() -> TestHarness {
    let h = TestHarness::builder().build().await.unwrap();
    h.store
        .upsert_user(&person("u-luis", "Luis Gómez", Role::User))
        .await
        .unwrap();
    h.store
        .upsert_user(&person("u-admin", "Marta", Role::Admin))
        .await
        .unwrap();
    let memory = h.memory().unwrap();
    memory
        .seed(incident("inc-aaaaaaaa-1", "Impresora atascada", "u-ana", Some("u-luis"), 3))
        .await;
    memory
        .seed(incident("inc-bbbbbbbb-2", "VPN no conecta", "u-ana", None, 1))
        .await;
    memory
        .seed(incident("inc-cccccccc-3", "Correo lento", "u-luis", Some("u-ana"), 2))
        .await;
    h
}

fn ids(list: &[PersistedIncident]) -> Vec<&str> {
    list.iter().map(|i| i.id.0.as_str()).collect()
}

#[tokio::test]
async fn listings_are_scoped_to_the_viewer_newest_first() {
    let h = seeded().await;
    let desk = h.desk();
    let ana = default_reporter();
    let none = IncidentFilter::default();

    let reported = desk.list(&ana, Listing::Reported, &none).await.unwrap();
    assert_eq!(ids(&reported), vec!["inc-bbbbbbbb-2", "inc-aaaaaaaa-1"]);

    let received = desk.list(&ana, Listing::Received, &none).await.unwrap();
    assert_eq!(ids(&received), vec!["inc-cccccccc-3"]);

    let admin = person("u-admin", "Marta", Role::Admin);
    let all = desk.list(&admin, Listing::Reported, &none).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn filter_matches_status_and_names_case_insensitively() {
    let h = seeded().await;
    let desk = h.desk();
    let admin = person("u-admin", "Marta", Role::Admin);

    let by_assignee = IncidentFilter {
        status: None,
        term: Some("LUIS gómez".into()),
    };
    let found = desk.list(&admin, Listing::Reported, &by_assignee).await.unwrap();
    assert_eq!(ids(&found), vec!["inc-cccccccc-3", "inc-aaaaaaaa-1"]);

    let by_title = IncidentFilter {
        status: None,
        term: Some("vpn".into()),
    };
    let found = desk.list(&admin, Listing::Reported, &by_title).await.unwrap();
    assert_eq!(ids(&found), vec!["inc-bbbbbbbb-2"]);

    desk.update_status(&admin, &IncidentId("inc-aaaaaaaa-1".into()), IncidentStatus::Resolved)
        .await
        .unwrap();
    let resolved = IncidentFilter {
        status: Some(IncidentStatus::Resolved),
        term: None,
    };
    let found = desk.list(&admin, Listing::Reported, &resolved).await.unwrap();
    assert_eq!(ids(&found), vec!["inc-aaaaaaaa-1"]);
}

#[tokio::test]
async fn only_owner_or_admin_may_edit_or_delete() {
    let h = seeded().await;
    let desk = h.desk();
    let luis = person("u-luis", "Luis Gómez", Role::User);
    let id = IncidentId("inc-aaaaaaaa-1".into());

    assert!(matches!(
        desk.open_for_edit(&luis, &id).await,
        Err(AirgiError::Unauthorized(_))
    ));
    assert!(matches!(
        desk.delete(&luis, &id).await,
        Err(AirgiError::Unauthorized(_))
    ));

    let opened = desk.open_for_edit(&default_reporter(), &id).await.unwrap();
    assert_eq!(opened.title, "Impresora atascada");

    let admin = person("u-admin", "Marta", Role::Admin);
    desk.delete(&admin, &id).await.unwrap();
    assert!(h.store.get_incident(&id).await.unwrap().is_none());
    assert!(matches!(
        desk.delete(&admin, &id).await,
        Err(AirgiError::NotFound { .. })
    ));
}

#[tokio::test]
async fn assignee_may_move_status_but_strangers_may_not() {
    let h = seeded().await;
    let desk = h.desk();
    let id = IncidentId("inc-aaaaaaaa-1".into());

    let luis = person("u-luis", "Luis Gómez", Role::User);
    desk.update_status(&luis, &id, IncidentStatus::InProgress)
        .await
        .unwrap();
    let stored = h.store.get_incident(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, IncidentStatus::InProgress);

    let stranger = person("u-pepe", "Pepe", Role::User);
    assert!(matches!(
        desk.update_status(&stranger, &id, IncidentStatus::Closed).await,
        Err(AirgiError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn share_digest_resolves_names() {
    let h = seeded().await;
    let desk = h.desk();
    let incident = h
        .store
        .get_incident(&IncidentId("inc-aaaaaaaa-1".into()))
        .await
        .unwrap()
        .unwrap();

    let digest = desk.share_message(&incident).await.unwrap();
    assert!(digest.starts_with("*Nueva Incidencia Reportada en AIRGI*"));
    assert!(digest.contains("*ID:* inc-aaaa..."));
    assert!(digest.contains("*Reportado por:* Ana Pérez"));
    assert!(digest.contains("*Asignado a:* Luis Gómez"));
    assert!(digest.contains("*Estado:* Nuevo"));
    assert!(digest.contains("*Prioridad IA:* Alta"));
    assert!(!digest.contains("*Adjuntos:*"));
}
