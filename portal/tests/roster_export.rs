//! Roster export behavior over the in-memory collaborators.

#![allow(clippy::unwrap_used)]

use campus_portal::{export_roster, EventId, RegistrantId, RegistrationService, Role, UserProfile};
use campus_portal_memstore::MemoryDocumentStore;
use campus_portal_testing::test_clock;
use campus_portal_core::document::CollectionPath;
use campus_portal_core::store::DocumentStore;
use std::sync::Arc;
use uuid::Uuid;

fn service_with_store() -> (RegistrationService, Arc<MemoryDocumentStore>) {
    let store = Arc::new(MemoryDocumentStore::new());
    (
        RegistrationService::new(store.clone(), Arc::new(test_clock())),
        store,
    )
}

#[tokio::test]
async fn empty_roster_produces_no_file() {
    let (service, _store) = service_with_store();
    let event = EventId::new("e1".into());

    let file = export_roster(&service, &event, "Orientation").await.unwrap();
    assert!(file.is_none());
}

#[tokio::test]
async fn roster_has_one_row_per_registration_with_or_without_profiles() {
    let (service, store) = service_with_store();
    let event = EventId::new("e1".into());

    // Three registrations, one of which has a stored profile.
    let profiled = RegistrantId::from_uuid(Uuid::new_v4());
    store
        .put(
            CollectionPath::root("users"),
            profiled.key(),
            serde_json::to_value(UserProfile {
                email: "alice@campus.edu".into(),
                role: Role::User,
                name: Some("Alice".into()),
                unique_id: Some("CS-001".into()),
                branch: Some("CSE".into()),
                year: Some("3".into()),
                section: Some("B".into()),
            })
            .unwrap(),
        )
        .await
        .unwrap();

    service.register(&event, profiled, "alice@campus.edu").await.unwrap();
    for i in 0..2 {
        service
            .register(
                &event,
                RegistrantId::from_uuid(Uuid::new_v4()),
                &format!("bare{i}@campus.edu"),
            )
            .await
            .unwrap();
    }

    let file = export_roster(&service, &event, "Orientation")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(file.filename, "Orientation_Registrations.xlsx");
    // xlsx files are zip containers.
    assert_eq!(&file.bytes[..2], b"PK");
    assert!(!file.bytes.is_empty());

    // The joined view backing the workbook has exactly one row per
    // registration, with the bare ones carrying no profile.
    let attendees = service.list_with_profiles(&event).await.unwrap();
    assert_eq!(attendees.len(), 3);
    assert_eq!(attendees.iter().filter(|a| a.profile.is_some()).count(), 1);
}

#[tokio::test]
async fn filename_derives_from_a_sanitized_title() {
    let (service, _store) = service_with_store();
    let event = EventId::new("e1".into());
    service
        .register(&event, RegistrantId::from_uuid(Uuid::new_v4()), "a@campus.edu")
        .await
        .unwrap();

    let file = export_roster(&service, &event, "AI/ML Night!")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(file.filename, "AI_ML Night__Registrations.xlsx");
}
