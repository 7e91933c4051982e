use campus_database::{Database, DocumentRef, DocumentStore, Fields};
use campus_domain::config::DanglingPolicy;
use campus_enrollment::*;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::time::Duration;

const AUTUMN: &str = "01/09/2024 - 30/12/2024";

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn store() -> Database {
    Database::builder()
        .backoff(Duration::from_millis(1), Duration::from_millis(4))
        .init()
        .expect("store init")
}

async fn put(db: &Database, collection: &str, id: &str, value: Value) {
    db.set(&DocumentRef::new(collection, id), fields(value)).await.unwrap();
}

async fn field(db: &Database, collection: &str, id: &str, name: &str) -> Value {
    let doc = db.get(&DocumentRef::new(collection, id)).await.unwrap().unwrap();
    doc.get(name).cloned().unwrap_or(Value::Null)
}

/// Sections X, Y, Z and W plus students s1..s3 as described by the acceptance scenarios.
async fn campus() -> Database {
    let db = store();
    put(&db, "classes", "X", json!({
        "name": "Linear Algebra", "dayOfWeek": "2, 4", "periods": "1-3",
        "dateRange": AUTUMN, "maxSlots": 1, "currentSlots": 0, "semester": "2024B"
    }))
    .await;
    put(&db, "classes", "Y", json!({
        "name": "Physics", "dayOfWeek": "2", "periods": "2-3",
        "dateRange": AUTUMN, "maxSlots": 10, "semester": "2024B"
    }))
    .await;
    put(&db, "classes", "Z", json!({
        "name": "Chemistry", "schedule": "2 | 2-3 | C1 | 01/01/2025 - 30/04/2025",
        "maxSlots": 10, "semester": "2024B"
    }))
    .await;
    put(&db, "classes", "W", json!({
        "name": "Seminar", "dayOfWeek": "7", "periods": "9",
        "maxSlots": 1, "currentSlots": 1, "semester": "2024B"
    }))
    .await;
    put(&db, "users", "s1", json!({ "uid": "uid-s1", "username": "alice", "role": "student" })).await;
    put(&db, "users", "s2", json!({ "uid": "uid-s2", "username": "bob", "registeredClassIds": ["W"] }))
        .await;
    put(&db, "users", "s3", json!({ "uid": "uid-s3", "username": "carol" })).await;
    db
}

#[tokio::test]
async fn scenario_a_register_then_repeat_is_a_no_op() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db.clone());

    let first = engine.register_or_unregister("s1", "X", "2024B", true).await.unwrap();
    assert_eq!(first, Outcome::Registered);
    assert_eq!(field(&db, "classes", "X", "currentSlots").await, json!(1));

    let again = engine.register_or_unregister("s1", "X", "2024B", true).await.unwrap();
    assert_eq!(again, Outcome::AlreadyRegistered);
    assert!(!again.changed());
    assert_eq!(field(&db, "classes", "X", "currentSlots").await, json!(1));
    assert_eq!(field(&db, "users", "s1", "registeredClassIds").await, json!(["X"]));
}

#[tokio::test]
async fn scenario_b_overlapping_section_is_rejected() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db.clone());
    engine.apply(&RegistrationRequest::register("s1", "X", "2024B")).await.unwrap();

    let err = engine.apply(&RegistrationRequest::register("s1", "Y", "2024B")).await.unwrap_err();
    let EnrollmentError::ScheduleConflict { conflict } = &err else {
        panic!("expected a schedule conflict, got {err:?}");
    };
    assert_eq!(conflict.section_id, "X");
    assert_eq!(conflict.name, "Linear Algebra");
    assert_eq!(conflict.days, BTreeSet::from([2]));
    assert_eq!(conflict.periods, BTreeSet::from([2, 3]));
    assert_eq!(conflict.date_range.as_deref(), Some(AUTUMN));
    assert!(err.is_client_error());

    assert_eq!(field(&db, "classes", "Y", "currentSlots").await, Value::Null);
    assert_eq!(field(&db, "users", "s1", "registeredClassIds").await, json!(["X"]));
}

#[tokio::test]
async fn scenario_c_wrong_term_is_rejected() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db.clone());

    let err = engine.register_or_unregister("s1", "Z", "2024A", true).await.unwrap_err();
    match err {
        EnrollmentError::TermMismatch { section, expected, actual } => {
            assert_eq!(section, "Z");
            assert_eq!(expected, "2024A");
            assert_eq!(actual, "2024B");
        },
        other => panic!("expected a term mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_d_full_section_is_rejected() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db.clone());

    let err = engine.register_or_unregister("s3", "W", "2024B", true).await.unwrap_err();
    assert!(matches!(err, EnrollmentError::CapacityExceeded { ref section_id, capacity: 1 } if section_id == "W"));
    assert_eq!(field(&db, "classes", "W", "currentSlots").await, json!(1));
    assert_eq!(field(&db, "users", "s3", "registeredClassIds").await, Value::Null);
}

#[tokio::test]
async fn scenario_e_unknown_identity_is_rejected() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db);

    let err = engine.register_or_unregister("ghost123", "X", "2024B", true).await.unwrap_err();
    assert!(matches!(err, EnrollmentError::IdentityNotFound { ref identifier } if identifier == "ghost123"));
    assert_eq!(err.kind(), "IdentityNotFound");
}

#[tokio::test]
async fn identities_resolve_by_uid_and_lowercased_username() {
    let db = campus().await;
    let resolver = IdentityResolver::new(db);

    assert_eq!(resolver.resolve("  s1 ").await.unwrap().id(), "s1");
    assert_eq!(resolver.resolve("uid-s2").await.unwrap().id(), "s2");
    assert_eq!(resolver.resolve("CAROL").await.unwrap().id(), "s3");
    assert!(matches!(
        resolver.resolve("   ").await,
        Err(EnrollmentError::IdentityNotFound { .. })
    ));
}

#[tokio::test]
async fn register_stamps_term_and_legacy_field() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db.clone());

    engine.register_or_unregister("carol", " Y ", "2024B", true).await.unwrap();
    assert_eq!(field(&db, "users", "s3", "registeredClassIds").await, json!(["Y"]));
    assert_eq!(field(&db, "users", "s3", "classId").await, json!("Y"));
    assert_eq!(field(&db, "users", "s3", "currentSemester").await, json!("2024B"));
    assert_eq!(field(&db, "users", "s3", "username").await, json!("carol"));
}

#[tokio::test]
async fn register_then_unregister_restores_state() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db.clone());
    let slots_before = field(&db, "classes", "X", "currentSlots").await;
    let set_before = field(&db, "users", "s2", "registeredClassIds").await;

    assert_eq!(
        engine.register_or_unregister("s2", "X", "2024B", true).await.unwrap(),
        Outcome::Registered
    );
    assert_eq!(field(&db, "users", "s2", "registeredClassIds").await, json!(["W", "X"]));
    assert_eq!(
        engine.register_or_unregister("s2", "X", "2024B", false).await.unwrap(),
        Outcome::Unregistered
    );

    assert_eq!(field(&db, "classes", "X", "currentSlots").await, slots_before);
    assert_eq!(field(&db, "users", "s2", "registeredClassIds").await, set_before);
}

#[tokio::test]
async fn unregistering_a_non_member_changes_nothing() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db.clone());

    let outcome = engine.register_or_unregister("s3", "W", "2024B", false).await.unwrap();
    assert_eq!(outcome, Outcome::NotRegistered);
    assert_eq!(field(&db, "classes", "W", "currentSlots").await, json!(1));
}

#[tokio::test]
async fn unregister_floors_the_counter_at_zero() {
    let db = campus().await;
    put(&db, "users", "s4", json!({ "registeredClassIds": ["Y"] })).await;
    let engine = EnrollmentCoordinator::new(db.clone());

    engine.register_or_unregister("s4", "Y", "2024B", false).await.unwrap();
    assert_eq!(field(&db, "classes", "Y", "currentSlots").await, json!(0));
}

#[tokio::test]
async fn legacy_single_section_field_counts_as_membership() {
    let db = campus().await;
    put(&db, "users", "old", json!({ "classId": "X" })).await;
    let engine = EnrollmentCoordinator::new(db.clone());

    assert_eq!(
        engine.register_or_unregister("old", "X", "2024B", true).await.unwrap(),
        Outcome::AlreadyRegistered
    );
    // the legacy section still takes part in the conflict scan
    let err = engine.register_or_unregister("old", "Y", "2024B", true).await.unwrap_err();
    assert_eq!(err.kind(), "ScheduleConflict");
}

#[tokio::test]
async fn sections_of_other_terms_are_not_compared() {
    let db = campus().await;
    put(&db, "classes", "OLD", json!({
        "name": "Old Physics", "dayOfWeek": "2", "periods": "2-3", "semester": "2024A"
    }))
    .await;
    put(&db, "users", "s5", json!({ "registeredClassIds": ["OLD"] })).await;
    let engine = EnrollmentCoordinator::new(db.clone());

    let outcome = engine.register_or_unregister("s5", "Y", "2024B", true).await.unwrap();
    assert_eq!(outcome, Outcome::Registered);
}

#[tokio::test]
async fn disjoint_date_ranges_do_not_conflict() {
    let db = campus().await;
    put(&db, "classes", "Z2", json!({
        "name": "Spring Lab", "schedule": "2 | 1-3 | Lab | 01/01/2025 - 30/04/2025",
        "maxSlots": 5, "semester": "2024B"
    }))
    .await;
    let engine = EnrollmentCoordinator::new(db.clone());
    engine.register_or_unregister("s1", "X", "2024B", true).await.unwrap();

    let outcome = engine.register_or_unregister("s1", "Z2", "2024B", true).await.unwrap();
    assert_eq!(outcome, Outcome::Registered);
}

#[tokio::test]
async fn missing_section_is_reported() {
    let db = campus().await;
    let engine = EnrollmentCoordinator::new(db);

    let err = engine.register_or_unregister("s1", "NOPE", "2024B", true).await.unwrap_err();
    assert!(matches!(err, EnrollmentError::SectionNotFound { ref section_id } if section_id == "NOPE"));
}

#[tokio::test]
async fn malformed_capacity_is_a_server_error() {
    let db = campus().await;
    put(&db, "classes", "BAD", json!({ "maxSlots": "lots", "semester": "2024B" })).await;
    let engine = EnrollmentCoordinator::new(db.clone());

    let err = engine.register_or_unregister("s3", "BAD", "2024B", true).await.unwrap_err();
    assert_eq!(err.kind(), "Internal");
    assert!(!err.is_client_error());
    assert_eq!(field(&db, "users", "s3", "registeredClassIds").await, Value::Null);
}

#[tokio::test]
async fn counts_stored_as_doubles_are_accepted() {
    let db = campus().await;
    put(&db, "classes", "F", json!({ "maxSlots": 50.0, "currentSlots": 0.0, "semester": "2024B" })).await;
    let engine = EnrollmentCoordinator::new(db.clone());

    let outcome = engine.register_or_unregister("s3", "F", "2024B", true).await.unwrap();
    assert_eq!(outcome, Outcome::Registered);
    assert_eq!(field(&db, "classes", "F", "currentSlots").await, json!(1));
}

#[tokio::test]
async fn section_without_term_matches_no_request() {
    let db = campus().await;
    put(&db, "classes", "N", json!({ "name": "Orientation", "maxSlots": 5 })).await;
    let engine = EnrollmentCoordinator::new(db.clone());

    let err = engine.register_or_unregister("s3", "N", "", true).await.unwrap_err();
    assert!(matches!(
        err,
        EnrollmentError::TermMismatch { ref expected, ref actual, .. } if expected.is_empty() && actual.is_empty()
    ));
    assert_eq!(field(&db, "classes", "N", "currentSlots").await, Value::Null);
    assert_eq!(field(&db, "users", "s3", "registeredClassIds").await, Value::Null);
}

#[tokio::test]
async fn dangling_ids_are_skipped_by_default() {
    let db = campus().await;
    put(&db, "users", "s6", json!({ "registeredClassIds": ["GONE", "W"] })).await;
    let engine = EnrollmentCoordinator::new(db.clone());
    assert_eq!(engine.dangling_policy(), DanglingPolicy::Skip);

    engine.register_or_unregister("s6", "Y", "2024B", true).await.unwrap();
    assert_eq!(field(&db, "users", "s6", "registeredClassIds").await, json!(["GONE", "W", "Y"]));
}

#[tokio::test]
async fn dangling_ids_are_pruned_on_commit() {
    let db = campus().await;
    put(&db, "users", "s6", json!({ "registeredClassIds": ["GONE", "W"] })).await;
    let engine = EnrollmentCoordinator::new(db.clone()).with_dangling_policy(DanglingPolicy::Prune);

    engine.register_or_unregister("s6", "Y", "2024B", true).await.unwrap();
    assert_eq!(field(&db, "users", "s6", "registeredClassIds").await, json!(["W", "Y"]));
}
