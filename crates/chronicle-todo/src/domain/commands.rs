//! Commands for the to-do context.

use chronicle_core::event::AggregateId;

/// Command to create a to-do item.
#[derive(Debug, Clone)]
pub struct CreateTodo {
    /// Who issues the command; `None` for the system.
    pub actor_id: Option<String>,
    /// Initial text.
    pub text: String,
}

/// Command to replace a to-do item's text.
#[derive(Debug, Clone)]
pub struct ChangeTodoText {
    /// Who issues the command.
    pub actor_id: Option<String>,
    /// The to-do item identifier.
    pub todo_id: AggregateId,
    /// Replacement text.
    pub text: String,
}

/// Command to mark a to-do item done or not done.
#[derive(Debug, Clone)]
pub struct SetTodoDone {
    /// Who issues the command.
    pub actor_id: Option<String>,
    /// The to-do item identifier.
    pub todo_id: AggregateId,
    /// New completion state.
    pub is_done: bool,
}

/// Command to soft-delete a to-do item.
#[derive(Debug, Clone)]
pub struct DeleteTodo {
    /// Who issues the command.
    pub actor_id: Option<String>,
    /// The to-do item identifier.
    pub todo_id: AggregateId,
}

/// Command to restore a soft-deleted to-do item.
#[derive(Debug, Clone)]
pub struct RestoreTodo {
    /// Who issues the command.
    pub actor_id: Option<String>,
    /// The to-do item identifier.
    pub todo_id: AggregateId,
}
