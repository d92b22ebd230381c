//! Command handlers for the to-do context.
//!
//! Each handler loads the aggregate through the repository, executes the
//! command, and saves the resulting events. Saving publishes them. Once the
//! store has confirmed a write the command succeeds even if the bus rejects
//! the events; they stay in the repository outbox and are delivered by a
//! later save.

use chronicle_core::aggregate::AggregateRoot;
use chronicle_core::clock::Clock;
use chronicle_core::error::DomainError;
use chronicle_core::event::AggregateId;
use chronicle_core::repository::AggregateRepository;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::aggregates::TodoItem;
use crate::domain::commands::{ChangeTodoText, CreateTodo, DeleteTodo, RestoreTodo, SetTodoDone};

/// Repository type used by the to-do context.
pub type TodoRepository = AggregateRepository<TodoItem>;

/// Result of a successfully handled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: AggregateId,
    /// The aggregate version after the command.
    pub version: i64,
    /// Identifiers of the events the command produced, in version order.
    pub event_ids: Vec<Uuid>,
}

async fn commit(mut item: TodoItem, repo: &TodoRepository) -> Result<TodoCommandResult, DomainError> {
    let event_ids: Vec<Uuid> = item
        .uncommitted_events()
        .iter()
        .map(|e| e.metadata.event_id)
        .collect();
    match repo.save(&mut item).await {
        Ok(()) => {}
        Err(DomainError::Publication(reason)) => warn!(
            aggregate_id = %item.aggregate_id(),
            pending = repo.pending_publications(),
            reason = %reason,
            "to-do saved, publication deferred"
        ),
        Err(err) => return Err(err),
    }
    info!(
        aggregate_id = %item.aggregate_id(),
        version = item.version(),
        events = event_ids.len(),
        "to-do saved"
    );
    Ok(TodoCommandResult {
        aggregate_id: item.aggregate_id().clone(),
        version: item.version(),
        event_ids,
    })
}

async fn load(
    todo_id: &AggregateId,
    include_deleted: bool,
    repo: &TodoRepository,
) -> Result<TodoItem, DomainError> {
    repo.load(todo_id, None, include_deleted)
        .await?
        .ok_or_else(|| DomainError::AggregateNotFound(todo_id.clone()))
}

/// Handles the `CreateTodo` command: creates a new item with a fresh id and
/// persists its `TodoCreated` event.
///
/// # Errors
///
/// Returns `DomainError::Validation` for blank text, or repository errors.
#[instrument(skip_all)]
pub async fn handle_create_todo(
    command: &CreateTodo,
    clock: &dyn Clock,
    repo: &TodoRepository,
) -> Result<TodoCommandResult, DomainError> {
    let item = TodoItem::create(
        AggregateId::generate(),
        &command.text,
        command.actor_id.clone(),
        clock,
    )?;
    commit(item, repo).await
}

/// Handles the `ChangeTodoText` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the item does not exist or is
/// deleted, `DomainError::Validation` for blank text, or repository errors.
#[instrument(skip_all, fields(todo_id = %command.todo_id))]
pub async fn handle_change_todo_text(
    command: &ChangeTodoText,
    clock: &dyn Clock,
    repo: &TodoRepository,
) -> Result<TodoCommandResult, DomainError> {
    let mut item = load(&command.todo_id, false, repo).await?;
    item.change_text(&command.text, command.actor_id.clone(), clock)?;
    commit(item, repo).await
}

/// Handles the `SetTodoDone` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the item does not exist or is
/// deleted, or repository errors.
#[instrument(skip_all, fields(todo_id = %command.todo_id))]
pub async fn handle_set_todo_done(
    command: &SetTodoDone,
    clock: &dyn Clock,
    repo: &TodoRepository,
) -> Result<TodoCommandResult, DomainError> {
    let mut item = load(&command.todo_id, false, repo).await?;
    item.set_done(command.is_done, command.actor_id.clone(), clock)?;
    commit(item, repo).await
}

/// Handles the `DeleteTodo` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the item does not exist or is
/// already deleted, or repository errors.
#[instrument(skip_all, fields(todo_id = %command.todo_id))]
pub async fn handle_delete_todo(
    command: &DeleteTodo,
    clock: &dyn Clock,
    repo: &TodoRepository,
) -> Result<TodoCommandResult, DomainError> {
    let mut item = load(&command.todo_id, false, repo).await?;
    item.delete(command.actor_id.clone(), clock)?;
    commit(item, repo).await
}

/// Handles the `RestoreTodo` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the item never existed,
/// `DomainError::Validation` if it is not deleted, or repository errors.
#[instrument(skip_all, fields(todo_id = %command.todo_id))]
pub async fn handle_restore_todo(
    command: &RestoreTodo,
    clock: &dyn Clock,
    repo: &TodoRepository,
) -> Result<TodoCommandResult, DomainError> {
    let mut item = load(&command.todo_id, true, repo).await?;
    item.restore(command.actor_id.clone(), clock)?;
    commit(item, repo).await
}
