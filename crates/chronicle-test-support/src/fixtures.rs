//! Stored-event fixtures.

use chronicle_core::event::{AggregateId, DeleteAction};
use chronicle_core::repository::StoredEvent;
use uuid::Uuid;

use crate::clock::fixed_time;

/// A committed-looking record for `aggregate_id` at `version`, with a fresh
/// event id and a small JSON payload.
#[must_use]
pub fn stored_event(aggregate_type: &str, aggregate_id: &str, version: i64) -> StoredEvent {
    StoredEvent {
        storage_seq: None,
        event_id: Uuid::now_v7(),
        actor_id: None,
        occurred_on: fixed_time(),
        version,
        delete_action: DeleteAction::None,
        aggregate_type: aggregate_type.to_owned(),
        aggregate_id: AggregateId::new(aggregate_id),
        event_type: "test.recorded".to_owned(),
        event_data: serde_json::json!({ "version": version }).to_string(),
    }
}

/// Versions `1..=count` of one stream.
#[must_use]
pub fn stream(aggregate_type: &str, aggregate_id: &str, count: i64) -> Vec<StoredEvent> {
    (1..=count)
        .map(|version| stored_event(aggregate_type, aggregate_id, version))
        .collect()
}
