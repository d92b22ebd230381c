//! Aggregate roots for the to-do context.

use chronicle_core::aggregate::{AggregateRoot, EventHistory};
use chronicle_core::clock::Clock;
use chronicle_core::error::DomainError;
use chronicle_core::event::{AggregateId, PendingEvent};

use super::events::{
    TodoCreated, TodoDeleted, TodoDoneSet, TodoEventKind, TodoRestored, TodoTextChanged,
};

/// The aggregate root for a to-do item.
#[derive(Debug)]
pub struct TodoItem {
    /// What needs doing.
    pub text: String,
    /// Whether it has been done.
    pub is_done: bool,
    history: EventHistory<TodoEventKind>,
}

fn validate_text(text: &str) -> Result<String, DomainError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation("to-do text must not be blank".into()));
    }
    Ok(trimmed.to_owned())
}

impl TodoItem {
    /// Creates a to-do item, producing a `TodoCreated` event at version 1.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `text` is blank.
    pub fn create(
        id: AggregateId,
        text: &str,
        actor_id: Option<String>,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        let text = validate_text(text)?;
        let mut item = Self::empty(id);
        item.raise(PendingEvent::new(TodoCreated { text }.into(), clock.now()).with_actor(actor_id));
        Ok(item)
    }

    /// Replaces the text, producing a `TodoTextChanged` event. Returns the
    /// current version unchanged if the text is already the same.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `text` is blank or the item is
    /// deleted.
    pub fn change_text(
        &mut self,
        text: &str,
        actor_id: Option<String>,
        clock: &dyn Clock,
    ) -> Result<i64, DomainError> {
        self.ensure_live()?;
        let text = validate_text(text)?;
        if text == self.text {
            return Ok(self.version());
        }
        Ok(self.raise(
            PendingEvent::new(TodoTextChanged { text }.into(), clock.now()).with_actor(actor_id),
        ))
    }

    /// Marks the item done or not done, producing a `TodoDoneSet` event.
    /// Returns the current version unchanged if nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item is deleted.
    pub fn set_done(
        &mut self,
        is_done: bool,
        actor_id: Option<String>,
        clock: &dyn Clock,
    ) -> Result<i64, DomainError> {
        self.ensure_live()?;
        if is_done == self.is_done {
            return Ok(self.version());
        }
        Ok(self.raise(
            PendingEvent::new(TodoDoneSet { is_done }.into(), clock.now()).with_actor(actor_id),
        ))
    }

    /// Soft-deletes the item, producing a `TodoDeleted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item is already deleted.
    pub fn delete(&mut self, actor_id: Option<String>, clock: &dyn Clock) -> Result<i64, DomainError> {
        self.ensure_live()?;
        Ok(self.raise(
            PendingEvent::new(TodoDeleted {}.into(), clock.now())
                .with_actor(actor_id)
                .deleting(),
        ))
    }

    /// Restores a deleted item, producing a `TodoRestored` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item is not deleted.
    pub fn restore(&mut self, actor_id: Option<String>, clock: &dyn Clock) -> Result<i64, DomainError> {
        if !self.is_deleted() {
            return Err(DomainError::Validation(format!(
                "to-do {} is not deleted",
                self.aggregate_id()
            )));
        }
        Ok(self.raise(
            PendingEvent::new(TodoRestored {}.into(), clock.now())
                .with_actor(actor_id)
                .undeleting(),
        ))
    }

    fn ensure_live(&self) -> Result<(), DomainError> {
        if self.is_deleted() {
            return Err(DomainError::Validation(format!(
                "to-do {} is deleted",
                self.aggregate_id()
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for TodoItem {
    type Event = TodoEventKind;
    const AGGREGATE_TYPE: &'static str = "todo";

    fn empty(id: AggregateId) -> Self {
        Self {
            text: String::new(),
            is_done: false,
            history: EventHistory::new(id),
        }
    }

    fn history(&self) -> &EventHistory<TodoEventKind> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut EventHistory<TodoEventKind> {
        &mut self.history
    }

    fn apply(&mut self, event: &TodoEventKind) {
        match event {
            TodoEventKind::Created(payload) => {
                self.text.clone_from(&payload.text);
                self.is_done = false;
            }
            TodoEventKind::TextChanged(payload) => self.text.clone_from(&payload.text),
            TodoEventKind::DoneSet(payload) => self.is_done = payload.is_done,
            // Deletion state is tracked by the history from the event metadata.
            TodoEventKind::Deleted(_) | TodoEventKind::Restored(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use chronicle_core::event::DeleteAction;
    use chronicle_test_support::FixedClock;

    use super::*;

    fn buy_milk() -> TodoItem {
        TodoItem::create(
            AggregateId::new("t-1"),
            "Buy milk",
            Some("alice".into()),
            &FixedClock::at_fixed_time(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_produces_created_event_at_version_one() {
        // Act
        let item = buy_milk();

        // Assert
        assert_eq!(item.text, "Buy milk");
        assert!(!item.is_done);
        assert_eq!(item.version(), 1);
        let events = item.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metadata.aggregate_type, "todo");
        assert_eq!(events[0].metadata.actor_id.as_deref(), Some("alice"));
        assert_eq!(
            events[0].kind,
            TodoEventKind::Created(TodoCreated {
                text: "Buy milk".into()
            })
        );
    }

    #[test]
    fn test_create_rejects_blank_text() {
        let result = TodoItem::create(
            AggregateId::new("t-1"),
            "   ",
            None,
            &FixedClock::at_fixed_time(),
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_set_done_raises_version_two() {
        // Arrange
        let mut item = buy_milk();

        // Act
        let version = item
            .set_done(true, None, &FixedClock::at_fixed_time())
            .unwrap();

        // Assert
        assert_eq!(version, 2);
        assert!(item.is_done);
        assert_eq!(item.uncommitted_events().len(), 2);
    }

    #[test]
    fn test_unchanged_values_raise_nothing() {
        let mut item = buy_milk();
        let clock = FixedClock::at_fixed_time();

        assert_eq!(item.set_done(false, None, &clock).unwrap(), 1);
        assert_eq!(item.change_text(" Buy milk ", None, &clock).unwrap(), 1);
        assert_eq!(item.uncommitted_events().len(), 1);
    }

    #[test]
    fn test_delete_then_restore_toggles_is_deleted() {
        // Arrange
        let mut item = buy_milk();
        let clock = FixedClock::at_fixed_time();

        // Act & Assert
        item.delete(None, &clock).unwrap();
        assert!(item.is_deleted());
        assert_eq!(
            item.uncommitted_events()[1].metadata.delete_action,
            DeleteAction::Delete
        );

        item.restore(None, &clock).unwrap();
        assert!(!item.is_deleted());
        assert_eq!(item.version(), 3);
    }

    #[test]
    fn test_deleted_item_rejects_changes() {
        let mut item = buy_milk();
        let clock = FixedClock::at_fixed_time();
        item.delete(None, &clock).unwrap();

        assert!(item.change_text("Buy bread", None, &clock).is_err());
        assert!(item.set_done(true, None, &clock).is_err());
        assert!(item.delete(None, &clock).is_err());
    }

    #[test]
    fn test_restore_requires_deleted_item() {
        let mut item = buy_milk();

        let result = item.restore(None, &FixedClock::at_fixed_time());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
