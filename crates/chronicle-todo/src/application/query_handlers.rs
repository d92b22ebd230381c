//! Query handlers for the to-do context.
//!
//! Queries rehydrate aggregates through the repository and return read-only
//! view DTOs.

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::error::DomainError;
use chronicle_core::event::AggregateId;
use serde::Serialize;

use crate::application::command_handlers::TodoRepository;
use crate::domain::aggregates::TodoItem;

/// Read-only view of a to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoView {
    /// The to-do item identifier.
    pub todo_id: String,
    /// What needs doing.
    pub text: String,
    /// Whether it has been done.
    pub is_done: bool,
    /// Whether it is soft-deleted.
    pub is_deleted: bool,
    /// Current version (event count).
    pub version: i64,
}

impl From<&TodoItem> for TodoView {
    fn from(item: &TodoItem) -> Self {
        Self {
            todo_id: item.aggregate_id().to_string(),
            text: item.text.clone(),
            is_done: item.is_done,
            is_deleted: item.is_deleted(),
            version: item.version(),
        }
    }
}

/// Retrieves one to-do item, optionally as of `version`.
///
/// A `version` returns the historical state even if the item was deleted
/// later or at that version.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the item has no events or is
/// hidden because it is deleted.
pub async fn get_todo_by_id(
    todo_id: &AggregateId,
    version: Option<i64>,
    include_deleted: bool,
    repo: &TodoRepository,
) -> Result<TodoView, DomainError> {
    repo.load(todo_id, version, include_deleted)
        .await?
        .map(|item| TodoView::from(&item))
        .ok_or_else(|| DomainError::AggregateNotFound(todo_id.clone()))
}

/// Retrieves the listed to-do items in request order, skipping unknown ids.
///
/// # Errors
///
/// Returns repository errors.
pub async fn get_todos_by_ids(
    todo_ids: &[AggregateId],
    include_deleted: bool,
    repo: &TodoRepository,
) -> Result<Vec<TodoView>, DomainError> {
    let items = repo.load_many(todo_ids, include_deleted).await?;
    Ok(items.iter().map(TodoView::from).collect())
}

/// Lists every to-do item, ordered by id.
///
/// # Errors
///
/// Returns repository errors.
pub async fn list_todos(
    include_deleted: bool,
    repo: &TodoRepository,
) -> Result<Vec<TodoView>, DomainError> {
    let items = repo.load_all(include_deleted).await?;
    Ok(items.iter().map(TodoView::from).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chronicle_core::bus::NoopEventBus;
    use chronicle_event_store::InMemoryEventStore;
    use chronicle_test_support::FixedClock;

    use super::*;
    use crate::domain::events::todo_event_codec;

    fn repo() -> TodoRepository {
        TodoRepository::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(NoopEventBus),
            Arc::new(todo_event_codec().unwrap()),
        )
    }

    async fn seed(repo: &TodoRepository, id: &str, text: &str) -> TodoItem {
        let clock = FixedClock::at_fixed_time();
        let mut item = TodoItem::create(AggregateId::new(id), text, None, &clock).unwrap();
        repo.save(&mut item).await.unwrap();
        item
    }

    #[tokio::test]
    async fn test_get_todo_by_id_returns_view() {
        // Arrange
        let repo = repo();
        seed(&repo, "t-1", "Buy milk").await;

        // Act
        let view = get_todo_by_id(&AggregateId::new("t-1"), None, false, &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(
            view,
            TodoView {
                todo_id: "t-1".into(),
                text: "Buy milk".into(),
                is_done: false,
                is_deleted: false,
                version: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_get_todo_by_id_returns_not_found_when_no_events() {
        let repo = repo();

        let result = get_todo_by_id(&AggregateId::new("missing"), None, false, &repo).await;

        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, AggregateId::new("missing")),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_historical_version_is_visible_after_delete() {
        // Arrange
        let repo = repo();
        let clock = FixedClock::at_fixed_time();
        let mut item = seed(&repo, "t-1", "Buy milk").await;
        item.change_text("Buy oat milk", None, &clock).unwrap();
        item.delete(None, &clock).unwrap();
        repo.save(&mut item).await.unwrap();
        let id = AggregateId::new("t-1");

        // Act
        let current = get_todo_by_id(&id, None, false, &repo).await;
        let at_two = get_todo_by_id(&id, Some(2), false, &repo).await.unwrap();
        let at_three = get_todo_by_id(&id, Some(3), false, &repo).await.unwrap();

        // Assert
        assert!(matches!(current, Err(DomainError::AggregateNotFound(_))));
        assert_eq!(at_two.text, "Buy oat milk");
        assert!(!at_two.is_deleted);
        assert!(at_three.is_deleted);
    }

    #[tokio::test]
    async fn test_list_and_batch_queries() {
        // Arrange
        let repo = repo();
        seed(&repo, "b", "Second").await;
        seed(&repo, "a", "First").await;
        let mut hidden = seed(&repo, "c", "Gone").await;
        hidden.delete(None, &FixedClock::at_fixed_time()).unwrap();
        repo.save(&mut hidden).await.unwrap();

        // Act
        let listed = list_todos(false, &repo).await.unwrap();
        let everything = list_todos(true, &repo).await.unwrap();
        let batch = get_todos_by_ids(
            &[AggregateId::new("c"), AggregateId::new("b"), AggregateId::new("zz")],
            true,
            &repo,
        )
        .await
        .unwrap();

        // Assert
        let ids: Vec<_> = listed.iter().map(|v| v.todo_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(everything.len(), 3);
        let ids: Vec<_> = batch.iter().map(|v| v.todo_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }
}
