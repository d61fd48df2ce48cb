//! The fixed table of failing tasks and the check bound to each.

use std::sync::Arc;

use crate::checks::{DoubleBookingCheck, FailureCheck, PastTimeCheck, RecipientValidityCheck};
use crate::domain::TaskDescriptor;

/// Address the recipient-validity task mails to. It does not exist.
pub const INVALID_RECIPIENT: &str = "sanat@example.com";

/// Title fragment identifying the meeting the double-booking task creates.
pub const CONFLICT_MARKER: &str = "update meeting";

/// Hour of the day (local) the past-time task asks for.
pub const PAST_TARGET_HOUR: u32 = 10;

/// A task and the predicate that decides whether it failed as designed.
#[derive(Clone)]
pub struct CatalogEntry {
    pub task: TaskDescriptor,
    pub check: Arc<dyn FailureCheck>,
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("task", &self.task)
            .field("check", &self.check.name())
            .finish()
    }
}

/// Ordered, immutable task table. Ids are unique; iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    entries: Vec<CatalogEntry>,
}

impl TaskCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task. A task whose id is already present replaces the earlier one in place.
    pub fn with_task(mut self, task: TaskDescriptor, check: Arc<dyn FailureCheck>) -> Self {
        let entry = CatalogEntry { task, check };
        match self.entries.iter_mut().find(|e| e.task.id == entry.task.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// The three built-in failing tasks.
    pub fn standard() -> Self {
        Self::new()
            .with_task(
                TaskDescriptor::new(
                    "task_1",
                    &format!(
                        "Send an email to {INVALID_RECIPIENT} with subject 'Important' and body 'Please review urgently'."
                    ),
                    "Email address does not exist in the system. Agent will fail if it doesn't validate recipient.",
                    "Agent sends email to non-existent address without error handling",
                ),
                Arc::new(RecipientValidityCheck::new(INVALID_RECIPIENT)),
            )
            .with_task(
                TaskDescriptor::new(
                    "task_2",
                    &format!(
                        "Schedule a calendar meeting for tomorrow at 10:00 AM with title '{CONFLICT_MARKER}' for 1 hour."
                    ),
                    "10:00 AM is already booked (existing meeting blocks this time). Agent doesn't check conflicts.",
                    "Agent attempts to book already occupied time slot",
                ),
                Arc::new(DoubleBookingCheck::new(CONFLICT_MARKER)),
            )
            .with_task(
                TaskDescriptor::new(
                    "task_3",
                    "Send an email to david@company.com saying 'Can we schedule a meeting for 10:00 AM today? and add it to calender '",
                    "It's already 1:25 PM. Agent should recognize past time and fail gracefully.",
                    "Agent tries to schedule meeting in the past",
                ),
                Arc::new(PastTimeCheck::new(PAST_TARGET_HOUR)),
            )
    }

    pub fn get(&self, task_id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.task.id == task_id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.entries.iter().map(|e| &e.task)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_order_and_ids() {
        let catalog = TaskCatalog::standard();
        let ids: Vec<&str> = catalog.tasks().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["task_1", "task_2", "task_3"]);
    }

    #[test]
    fn test_each_task_has_its_check() {
        let catalog = TaskCatalog::standard();
        assert_eq!(catalog.get("task_1").unwrap().check.name(), "recipient_validity");
        assert_eq!(catalog.get("task_2").unwrap().check.name(), "double_booking");
        assert_eq!(catalog.get("task_3").unwrap().check.name(), "past_time");
        assert!(catalog.get("task_4").is_none());
    }

    #[test]
    fn test_instructions_are_verbatim() {
        let catalog = TaskCatalog::standard();
        assert_eq!(
            catalog.get("task_1").unwrap().task.instruction,
            "Send an email to sanat@example.com with subject 'Important' and body 'Please review urgently'."
        );
        assert!(catalog
            .get("task_2")
            .unwrap()
            .task
            .instruction
            .contains("'update meeting'"));
    }

    #[test]
    fn test_duplicate_id_replaces() {
        let catalog = TaskCatalog::standard().with_task(
            TaskDescriptor::new("task_1", "other", "r", "e"),
            Arc::new(PastTimeCheck::new(9)),
        );
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("task_1").unwrap().task.instruction, "other");
    }
}
