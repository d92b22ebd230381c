//! Domain events for the to-do context.

use chronicle_core::codec::EventCodec;
use chronicle_core::error::DomainError;
use chronicle_core::event::EventKind;
use serde::{Deserialize, Serialize};

/// Event type tag for `TodoCreated`.
pub const TODO_CREATED_EVENT_TYPE: &str = "todo.created";
/// Event type tag for `TodoTextChanged`.
pub const TODO_TEXT_CHANGED_EVENT_TYPE: &str = "todo.text_changed";
/// Event type tag for `TodoDoneSet`.
pub const TODO_DONE_SET_EVENT_TYPE: &str = "todo.done_set";
/// Event type tag for `TodoDeleted`.
pub const TODO_DELETED_EVENT_TYPE: &str = "todo.deleted";
/// Event type tag for `TodoRestored`.
pub const TODO_RESTORED_EVENT_TYPE: &str = "todo.restored";

/// Emitted when a to-do item is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCreated {
    /// Initial text.
    pub text: String,
}

/// Emitted when a to-do item's text changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoTextChanged {
    /// Replacement text.
    pub text: String,
}

/// Emitted when a to-do item is marked done or not done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDoneSet {
    /// New completion state.
    pub is_done: bool,
}

/// Emitted when a to-do item is soft-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoDeleted {}

/// Emitted when a soft-deleted to-do item is restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRestored {}

/// Event payload variants for the to-do context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoEventKind {
    /// A to-do item has been created.
    Created(TodoCreated),
    /// A to-do item's text has changed.
    TextChanged(TodoTextChanged),
    /// A to-do item's completion state has changed.
    DoneSet(TodoDoneSet),
    /// A to-do item has been deleted.
    Deleted(TodoDeleted),
    /// A to-do item has been restored.
    Restored(TodoRestored),
}

impl From<TodoCreated> for TodoEventKind {
    fn from(value: TodoCreated) -> Self {
        Self::Created(value)
    }
}

impl From<TodoTextChanged> for TodoEventKind {
    fn from(value: TodoTextChanged) -> Self {
        Self::TextChanged(value)
    }
}

impl From<TodoDoneSet> for TodoEventKind {
    fn from(value: TodoDoneSet) -> Self {
        Self::DoneSet(value)
    }
}

impl From<TodoDeleted> for TodoEventKind {
    fn from(value: TodoDeleted) -> Self {
        Self::Deleted(value)
    }
}

impl From<TodoRestored> for TodoEventKind {
    fn from(value: TodoRestored) -> Self {
        Self::Restored(value)
    }
}

impl EventKind for TodoEventKind {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => TODO_CREATED_EVENT_TYPE,
            Self::TextChanged(_) => TODO_TEXT_CHANGED_EVENT_TYPE,
            Self::DoneSet(_) => TODO_DONE_SET_EVENT_TYPE,
            Self::Deleted(_) => TODO_DELETED_EVENT_TYPE,
            Self::Restored(_) => TODO_RESTORED_EVENT_TYPE,
        }
    }

    fn to_data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Created(payload) => serde_json::to_value(payload),
            Self::TextChanged(payload) => serde_json::to_value(payload),
            Self::DoneSet(payload) => serde_json::to_value(payload),
            Self::Deleted(payload) => serde_json::to_value(payload),
            Self::Restored(payload) => serde_json::to_value(payload),
        }
    }
}

/// Builds the codec with every to-do event registered.
///
/// # Errors
///
/// Returns `DomainError::DuplicateEventType` if two variants share a tag.
pub fn todo_event_codec() -> Result<EventCodec<TodoEventKind>, DomainError> {
    EventCodec::new()
        .register::<TodoCreated>(TODO_CREATED_EVENT_TYPE)?
        .register::<TodoTextChanged>(TODO_TEXT_CHANGED_EVENT_TYPE)?
        .register::<TodoDoneSet>(TODO_DONE_SET_EVENT_TYPE)?
        .register::<TodoDeleted>(TODO_DELETED_EVENT_TYPE)?
        .register::<TodoRestored>(TODO_RESTORED_EVENT_TYPE)
}
