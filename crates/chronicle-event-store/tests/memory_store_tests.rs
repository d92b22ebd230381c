//! Backend contract checks for `InMemoryEventStore`.

mod common;

use std::sync::Arc;

use chronicle_core::repository::EventStore;
use chronicle_event_store::InMemoryEventStore;

fn store() -> Arc<dyn EventStore> {
    Arc::new(InMemoryEventStore::new())
}

#[tokio::test]
async fn test_load_of_unknown_stream_is_empty() {
    common::load_of_unknown_stream_is_empty(store()).await;
}

#[tokio::test]
async fn test_persisted_fields_round_trip() {
    common::persisted_fields_round_trip(store()).await;
}

#[tokio::test]
async fn test_loads_are_ordered_and_capped() {
    common::loads_are_ordered_and_capped(store()).await;
}

#[tokio::test]
async fn test_streams_are_isolated_by_type_and_id() {
    common::streams_are_isolated_by_type_and_id(store()).await;
}

#[tokio::test]
async fn test_load_many_returns_only_requested_streams() {
    common::load_many_returns_only_requested_streams(store()).await;
}

#[tokio::test]
async fn test_duplicate_version_conflicts_and_batch_is_atomic() {
    common::duplicate_version_conflicts_and_batch_is_atomic(store()).await;
}

#[tokio::test]
async fn test_empty_persist_is_a_noop() {
    common::empty_persist_is_a_noop(store()).await;
}

#[tokio::test]
async fn test_concurrent_writers_conflict() {
    common::concurrent_writers_conflict(store()).await;
}

#[tokio::test]
async fn test_saved_aggregate_reloads_with_history() {
    common::saved_aggregate_reloads_with_history(store()).await;
}

#[tokio::test]
async fn test_deleted_aggregates_follow_visibility_rules() {
    common::deleted_aggregates_follow_visibility_rules(store()).await;
}
