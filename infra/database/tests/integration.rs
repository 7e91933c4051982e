use campus_database::{
    Database, DatabaseError, DocumentRef, DocumentStore, Fields, Filter, Transaction, UNLIMITED,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn store() -> Database {
    Database::builder()
        .name("test")
        .backoff(Duration::from_millis(1), Duration::from_millis(4))
        .init()
        .expect("store init")
}

#[test]
fn builder_rejects_zero_attempts() {
    let err = Database::builder().max_attempts(0).init().unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[test]
fn builder_rejects_inverted_backoff() {
    let err = Database::builder()
        .backoff(Duration::from_millis(100), Duration::from_millis(10))
        .init()
        .unwrap_err();
    assert_eq!(err.kind(), "Validation");
}

#[tokio::test]
async fn update_merges_fields_and_requires_existing_document() {
    let db = store();
    let doc = DocumentRef::new("classes", "CS101");
    db.set(&doc, fields(json!({ "name": "Intro", "currentSlots": 3 }))).await.unwrap();

    db.update(&doc, fields(json!({ "currentSlots": 4 }))).await.unwrap();
    let stored = db.get(&doc).await.unwrap().unwrap();
    assert_eq!(stored.get("name"), Some(&json!("Intro")));
    assert_eq!(stored.get("currentSlots"), Some(&json!(4)));

    let missing = db.update(&DocumentRef::new("classes", "NOPE"), Fields::new()).await;
    assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
}

#[tokio::test]
async fn query_filters_orders_by_key_and_limits() {
    let db = store();
    for (key, username, groups) in
        [("u3", "carol", json!(["a"])), ("u1", "alice", json!(["a", "b"])), ("u2", "bob", json!([]))]
    {
        db.set(&DocumentRef::new("users", key), fields(json!({ "username": username, "groups": groups })))
            .await
            .unwrap();
    }

    let by_name = db.query("users", &Filter::eq("username", "bob"), 1).await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id(), "u2");

    let in_a = db.query("users", &Filter::contains("groups", "a"), UNLIMITED).await.unwrap();
    let ids: Vec<_> = in_a.iter().map(|d| d.id()).collect();
    assert_eq!(ids, ["u1", "u3"]);

    let first = db.query("users", &Filter::contains("groups", "a"), 1).await.unwrap();
    assert_eq!(first[0].id(), "u1");

    assert!(db.query("missing", &Filter::eq("x", 1), UNLIMITED).await.unwrap().is_empty());
}

#[tokio::test]
async fn decode_maps_fields_into_typed_record() {
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Section {
        name: String,
        max_slots: u32,
    }

    let db = store();
    let doc = DocumentRef::new("classes", "CS101");
    db.set(&doc, fields(json!({ "name": "Intro", "maxSlots": 40 }))).await.unwrap();
    let section: Section = db.get(&doc).await.unwrap().unwrap().decode().unwrap();
    assert_eq!(section.name, "Intro");
    assert_eq!(section.max_slots, 40);

    db.set(&doc, fields(json!({ "name": 7 }))).await.unwrap();
    let err = db.get(&doc).await.unwrap().unwrap().decode::<Section>().unwrap_err();
    assert_eq!(err.kind(), "Serialization");
}

#[tokio::test]
async fn delete_reports_presence() {
    let db = store();
    let doc = DocumentRef::new("classes", "CS101");
    db.set(&doc, Fields::new()).await.unwrap();
    assert!(db.delete(&doc).await.unwrap());
    assert!(!db.delete(&doc).await.unwrap());
    assert!(db.get(&doc).await.unwrap().is_none());
}

#[tokio::test]
async fn body_error_discards_buffered_writes() {
    let db = store();
    let doc = DocumentRef::new("classes", "CS101");
    db.set(&doc, fields(json!({ "currentSlots": 0 }))).await.unwrap();

    let result: Result<(), DatabaseError> = db
        .transaction(|tx: &mut dyn Transaction| {
            tx.update(&doc, fields(json!({ "currentSlots": 1 })))?;
            Err("rejected".into())
        })
        .await;

    assert!(matches!(result, Err(DatabaseError::Internal { .. })));
    assert_eq!(db.get(&doc).await.unwrap().unwrap().get("currentSlots"), Some(&json!(0)));
}

#[tokio::test]
async fn conflicting_write_reruns_the_body() {
    let db = store();
    let doc = DocumentRef::new("classes", "CS101");
    db.set(&doc, fields(json!({ "currentSlots": 0 }))).await.unwrap();

    let runs = AtomicU32::new(0);
    let outside = db.clone();
    let count = db
        .transaction(|tx: &mut dyn Transaction| {
            let current = tx.get(&doc)?.and_then(|d| d.get("currentSlots").and_then(Value::as_u64));
            let current = current.unwrap_or_default();
            if runs.fetch_add(1, Ordering::SeqCst) == 0 {
                // a competing writer lands between our read and our commit
                let mut patch = Fields::new();
                patch.insert("currentSlots".into(), json!(10));
                poll_once(outside.update(&doc, patch))?;
            }
            tx.update(&doc, fields(json!({ "currentSlots": current + 1 })))?;
            Ok::<_, DatabaseError>(current + 1)
        })
        .await
        .unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(count, 11);
    assert_eq!(db.get(&doc).await.unwrap().unwrap().get("currentSlots"), Some(&json!(11)));
}

#[tokio::test]
async fn persistent_conflict_reports_contention() {
    let db = Database::builder()
        .max_attempts(3)
        .backoff(Duration::from_millis(1), Duration::from_millis(2))
        .init()
        .unwrap();
    let doc = DocumentRef::new("classes", "CS101");
    db.set(&doc, fields(json!({ "currentSlots": 0 }))).await.unwrap();

    let runs = AtomicU32::new(0);
    let outside = db.clone();
    let result = db
        .transaction(|tx: &mut dyn Transaction| {
            runs.fetch_add(1, Ordering::SeqCst);
            tx.get(&doc)?;
            poll_once(outside.set(&doc, fields(json!({ "currentSlots": 0 }))))?;
            tx.update(&doc, fields(json!({ "currentSlots": 1 })))?;
            Ok::<_, DatabaseError>(())
        })
        .await;

    assert_eq!(result.unwrap_err().kind(), "Contention");
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_serialized() {
    let db = Database::builder()
        .max_attempts(64)
        .backoff(Duration::from_millis(1), Duration::from_millis(8))
        .init()
        .unwrap();
    let doc = Arc::new(DocumentRef::new("classes", "CS101"));
    db.set(&doc, fields(json!({ "currentSlots": 0 }))).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let db = db.clone();
        let doc = Arc::clone(&doc);
        handles.push(tokio::spawn(async move {
            db.transaction(|tx: &mut dyn Transaction| {
                let current = tx
                    .get(&doc)?
                    .and_then(|d| d.get("currentSlots").and_then(Value::as_u64))
                    .unwrap_or_default();
                tx.update(&doc, fields(json!({ "currentSlots": current + 1 })))?;
                Ok::<_, DatabaseError>(())
            })
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(db.get(&doc).await.unwrap().unwrap().get("currentSlots"), Some(&json!(32)));
}

/// The store's non-transactional futures never suspend, so a single poll completes them.
fn poll_once<F: std::future::Future>(future: F) -> F::Output {
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    let mut future = pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    match future.as_mut().poll(&mut cx) {
        Poll::Ready(output) => output,
        Poll::Pending => panic!("store future suspended"),
    }
}
