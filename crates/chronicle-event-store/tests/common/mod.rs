//! Behaviour every `EventStore` backend must share.
//!
//! Each test file builds its backend and calls these checks.

#![allow(dead_code)]

use std::sync::Arc;

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::bus::NoopEventBus;
use chronicle_core::error::DomainError;
use chronicle_core::event::{AggregateId, DeleteAction};
use chronicle_core::repository::{AggregateRepository, EventStore};
use chronicle_test_support::fixtures::{stored_event, stream};
use chronicle_test_support::{Counter, RecordingEventBus, counter_codec};

pub fn counters(store: Arc<dyn EventStore>) -> AggregateRepository<Counter> {
    AggregateRepository::new(store, Arc::new(NoopEventBus), Arc::new(counter_codec().unwrap()))
}

pub async fn load_of_unknown_stream_is_empty(store: Arc<dyn EventStore>) {
    let events = store
        .load_raw("todo", &AggregateId::new("missing"), None)
        .await
        .unwrap();

    assert!(events.is_empty());
}

pub async fn persisted_fields_round_trip(store: Arc<dyn EventStore>) {
    // Arrange
    let mut event = stored_event("todo", "t-1", 1);
    event.actor_id = Some("alice".into());
    event.delete_action = DeleteAction::Delete;
    event.event_data = serde_json::json!({
        "nested": {"key": "value", "number": 42},
        "array": [1, "two", null, true],
        "text": "ünïcødé"
    })
    .to_string();

    // Act
    store.persist_raw(std::slice::from_ref(&event)).await.unwrap();
    let loaded = store
        .load_raw("todo", &AggregateId::new("t-1"), None)
        .await
        .unwrap();

    // Assert
    assert_eq!(loaded.len(), 1);
    let e = &loaded[0];
    assert!(e.storage_seq.is_some());
    assert_eq!(e.event_id, event.event_id);
    assert_eq!(e.actor_id.as_deref(), Some("alice"));
    assert_eq!(e.occurred_on, event.occurred_on);
    assert_eq!(e.version, 1);
    assert_eq!(e.delete_action, DeleteAction::Delete);
    assert_eq!(e.aggregate_type, "todo");
    assert_eq!(e.aggregate_id, AggregateId::new("t-1"));
    assert_eq!(e.event_type, event.event_type);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&e.event_data).unwrap(),
        serde_json::from_str::<serde_json::Value>(&event.event_data).unwrap()
    );
}

pub async fn loads_are_ordered_and_capped(store: Arc<dyn EventStore>) {
    // Arrange: persist versions out of order across two calls.
    let events = stream("todo", "t-1", 3);
    store.persist_raw(&events[2..]).await.unwrap();
    store.persist_raw(&events[..2]).await.unwrap();
    let id = AggregateId::new("t-1");

    // Act
    let all = store.load_raw("todo", &id, None).await.unwrap();
    let capped = store.load_raw("todo", &id, Some(2)).await.unwrap();

    // Assert
    let versions: Vec<_> = all.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    let versions: Vec<_> = capped.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2]);
}

pub async fn streams_are_isolated_by_type_and_id(store: Arc<dyn EventStore>) {
    store
        .persist_raw(&[
            stored_event("todo", "a", 1),
            stored_event("todo", "b", 1),
            stored_event("note", "a", 1),
        ])
        .await
        .unwrap();

    let todo_a = store.load_raw("todo", &AggregateId::new("a"), None).await.unwrap();
    let notes = store.load_raw_all("note").await.unwrap();

    assert_eq!(todo_a.len(), 1);
    assert_eq!(todo_a[0].aggregate_type, "todo");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].aggregate_id, AggregateId::new("a"));
}

pub async fn load_many_returns_only_requested_streams(store: Arc<dyn EventStore>) {
    let mut events = stream("todo", "a", 2);
    events.extend(stream("todo", "b", 1));
    events.extend(stream("todo", "c", 1));
    store.persist_raw(&events).await.unwrap();

    let loaded = store
        .load_raw_many("todo", &[AggregateId::new("c"), AggregateId::new("a")])
        .await
        .unwrap();
    let none = store.load_raw_many("todo", &[]).await.unwrap();

    let keys: Vec<_> = loaded
        .iter()
        .map(|e| (e.aggregate_id.to_string(), e.version))
        .collect();
    assert_eq!(
        keys,
        vec![("a".to_owned(), 1), ("a".to_owned(), 2), ("c".to_owned(), 1)]
    );
    assert!(none.is_empty());
}

pub async fn duplicate_version_conflicts_and_batch_is_atomic(store: Arc<dyn EventStore>) {
    // Arrange
    store.persist_raw(&[stored_event("todo", "a", 1)]).await.unwrap();

    // Act: the second row of this batch collides.
    let result = store
        .persist_raw(&[stored_event("todo", "b", 1), stored_event("todo", "a", 1)])
        .await;

    // Assert
    match result {
        Err(DomainError::VersionConflict {
            aggregate_type,
            aggregate_id,
            version,
        }) => {
            assert_eq!(aggregate_type, "todo");
            assert_eq!(aggregate_id, AggregateId::new("a"));
            assert_eq!(version, 1);
        }
        other => panic!("expected VersionConflict, got {other:?}"),
    }
    let b = store.load_raw("todo", &AggregateId::new("b"), None).await.unwrap();
    assert!(b.is_empty(), "no row of a failed batch may be visible");
}

pub async fn empty_persist_is_a_noop(store: Arc<dyn EventStore>) {
    store.persist_raw(&[]).await.unwrap();

    assert!(store.load_raw_all("todo").await.unwrap().is_empty());
}

pub async fn concurrent_writers_conflict(store: Arc<dyn EventStore>) {
    // Arrange: two repositories over the same backend load the same counter.
    let first = counters(Arc::clone(&store));
    let second = counters(Arc::clone(&store));
    let id = AggregateId::new("c-1");
    let mut counter = Counter::new("c-1");
    counter.increment(1);
    first.save(&mut counter).await.unwrap();

    let mut mine = first.get(&id).await.unwrap().unwrap();
    let mut theirs = second.get(&id).await.unwrap().unwrap();

    // Act
    mine.increment(10);
    theirs.increment(100);
    first.save(&mut mine).await.unwrap();
    let result = second.save(&mut theirs).await;

    // Assert
    let err = result.unwrap_err();
    assert!(err.is_conflict(), "expected conflict, got {err:?}");
    assert!(theirs.has_pending_changes());
    let reloaded = second.get(&id).await.unwrap().unwrap();
    assert_eq!(reloaded.value, 11);
    assert_eq!(reloaded.version(), 2);
}

pub async fn saved_aggregate_reloads_with_history(store: Arc<dyn EventStore>) {
    // Arrange
    let bus = Arc::new(RecordingEventBus::new());
    let repo: AggregateRepository<Counter> =
        AggregateRepository::new(store, bus.clone(), Arc::new(counter_codec().unwrap()));
    let mut counter = Counter::new("c-1");
    counter.increment(2);
    counter.increment(3);

    // Act
    repo.save(&mut counter).await.unwrap();
    let loaded = repo.get(&AggregateId::new("c-1")).await.unwrap().unwrap();

    // Assert
    assert_eq!(loaded.value, 5);
    assert_eq!(loaded.version(), 2);
    assert!(!loaded.has_pending_changes());
    assert_eq!(
        bus.published_keys(),
        vec![("c-1".to_owned(), 1), ("c-1".to_owned(), 2)]
    );
}

pub async fn deleted_aggregates_follow_visibility_rules(store: Arc<dyn EventStore>) {
    // Arrange
    let repo = counters(store);
    let id = AggregateId::new("c-1");
    let mut counter = Counter::new("c-1");
    counter.increment(4);
    counter.retire();
    repo.save(&mut counter).await.unwrap();

    // Act
    let hidden = repo.get(&id).await.unwrap();
    let shown = repo.load(&id, None, true).await.unwrap();
    let before_delete = repo.load(&id, Some(1), false).await.unwrap();
    let listed = repo.load_all(false).await.unwrap();

    // Assert
    assert!(hidden.is_none());
    assert!(shown.unwrap().is_deleted());
    let before_delete = before_delete.unwrap();
    assert!(!before_delete.is_deleted());
    assert_eq!(before_delete.value, 4);
    assert!(listed.is_empty());
    assert!(repo.exists(&id).await.unwrap());
}
