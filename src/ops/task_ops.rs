use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::model::task::{Priority, Task, TaskId, TaskList};

/// Error type for task operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task text cannot be empty")]
    EmptyText,
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Suffix appended to the text of a duplicated task
pub const COPY_SUFFIX: &str = " (Copy)";

// ---------------------------------------------------------------------------
// Task CRUD
// ---------------------------------------------------------------------------

/// Add a task to the top of the list. Returns the assigned ID.
pub fn add_task(
    list: &mut TaskList,
    text: &str,
    priority: Priority,
    now: DateTime<Utc>,
) -> Result<TaskId, TaskError> {
    let text = validate_text(text)?;
    let id = list.next_id(now);
    list.tasks.insert(0, Task::new(id, text, priority, now));
    Ok(id)
}

/// Flip a task's completion. Returns the new `completed` value.
pub fn toggle_task(list: &mut TaskList, id: TaskId, now: DateTime<Utc>) -> Result<bool, TaskError> {
    let task = find_task_mut(list, id)?;
    task.completed = !task.completed;
    task.touch(now);
    Ok(task.completed)
}

/// Replace a task's text with the trimmed `new_text`.
pub fn edit_text(
    list: &mut TaskList,
    id: TaskId,
    new_text: &str,
    now: DateTime<Utc>,
) -> Result<(), TaskError> {
    let text = validate_text(new_text)?;
    let task = find_task_mut(list, id)?;
    task.text = text;
    task.touch(now);
    Ok(())
}

/// Remove a task, returning it.
pub fn remove_task(list: &mut TaskList, id: TaskId) -> Result<Task, TaskError> {
    let idx = list.position(id).ok_or(TaskError::NotFound(id))?;
    Ok(list.tasks.remove(idx))
}

/// Copy a task to the top of the list as a fresh, open task.
/// Returns the ID of the copy.
pub fn duplicate_task(list: &mut TaskList, id: TaskId, now: DateTime<Utc>) -> Result<TaskId, TaskError> {
    let source = list.get(id).ok_or(TaskError::NotFound(id))?;
    let text = format!("{}{}", source.text, COPY_SUFFIX);
    let priority = source.priority;
    let new_id = list.next_id(now);
    list.tasks.insert(0, Task::new(new_id, text, priority, now));
    Ok(new_id)
}

/// Advance priority low → medium → high → low. Returns the new priority.
pub fn cycle_priority(list: &mut TaskList, id: TaskId, now: DateTime<Utc>) -> Result<Priority, TaskError> {
    let task = find_task_mut(list, id)?;
    task.priority = task.priority.next();
    task.touch(now);
    Ok(task.priority)
}

// ---------------------------------------------------------------------------
// Bulk removal
// ---------------------------------------------------------------------------

/// Remove every completed task. Returns how many were removed.
pub fn clear_completed(list: &mut TaskList) -> usize {
    let before = list.len();
    list.tasks.retain(|t| !t.completed);
    before - list.len()
}

/// Remove every task. Returns how many were removed.
///
/// Destructive: callers confirm with the user first.
pub fn clear_all(list: &mut TaskList) -> usize {
    let count = list.len();
    list.tasks.clear();
    count
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Where to move a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Top,
    Bottom,
    /// Directly below the task with this ID
    After(TaskId),
}

/// Reorder the list to follow `order`.
///
/// Unknown IDs are ignored and repeated IDs count at their first occurrence.
/// Tasks missing from `order` keep their relative order after the listed ones.
/// Returns true if the order changed.
pub fn reorder(list: &mut TaskList, order: &[TaskId]) -> bool {
    let before: Vec<TaskId> = list.iter().map(|t| t.id).collect();
    let mut seen = HashSet::new();
    let mut remaining: Vec<Option<Task>> = list.tasks.drain(..).map(Some).collect();
    let mut reordered = Vec::with_capacity(remaining.len());

    for id in order {
        if !seen.insert(*id) {
            continue;
        }
        if let Some(slot) = remaining
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|t| t.id == *id))
        {
            reordered.extend(slot.take());
        }
    }
    reordered.extend(remaining.into_iter().flatten());
    list.tasks = reordered;

    !list.iter().map(|t| t.id).eq(before)
}

/// Move one task to a new position. Returns true if the order changed.
pub fn move_task(list: &mut TaskList, id: TaskId, position: InsertPosition) -> Result<bool, TaskError> {
    let from = list.position(id).ok_or(TaskError::NotFound(id))?;
    let mut order: Vec<TaskId> = list.iter().map(|t| t.id).collect();
    order.remove(from);

    let to = match position {
        InsertPosition::Top => 0,
        InsertPosition::Bottom => order.len(),
        InsertPosition::After(target) => {
            if target == id {
                return Ok(false);
            }
            let idx = order
                .iter()
                .position(|t| *t == target)
                .ok_or(TaskError::NotFound(target))?;
            idx + 1
        }
    };
    order.insert(to, id);
    Ok(reorder(list, &order))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trim `text`, rejecting blank input.
pub fn validate_text(text: &str) -> Result<String, TaskError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TaskError::EmptyText);
    }
    Ok(trimmed.to_string())
}

fn find_task_mut(list: &mut TaskList, id: TaskId) -> Result<&mut Task, TaskError> {
    list.get_mut(id).ok_or(TaskError::NotFound(id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    /// Three tasks, newest on top: Third, Second (done, high), First
    fn sample_list() -> TaskList {
        let mut list = TaskList::new();
        add_task(&mut list, "First", Priority::Low, at(0)).unwrap();
        let second = add_task(&mut list, "Second", Priority::High, at(1)).unwrap();
        add_task(&mut list, "Third", Priority::Medium, at(2)).unwrap();
        toggle_task(&mut list, second, at(3)).unwrap();
        list
    }

    fn texts(list: &TaskList) -> Vec<&str> {
        list.iter().map(|t| t.text.as_str()).collect()
    }

    fn ids(list: &TaskList) -> Vec<TaskId> {
        list.iter().map(|t| t.id).collect()
    }

    // --- CRUD ---

    #[test]
    fn test_add_task_inserts_at_top_trimmed() {
        let mut list = sample_list();
        let id = add_task(&mut list, "  Buy milk  ", Priority::Low, at(10)).unwrap();
        assert_eq!(list.tasks[0].id, id);
        assert_eq!(list.tasks[0].text, "Buy milk");
        assert!(!list.tasks[0].completed);
        assert_eq!(list.tasks[0].created_at, at(10));
        assert_eq!(list.tasks[0].updated_at, at(10));
    }

    #[test]
    fn test_add_task_rejects_blank_text() {
        let mut list = sample_list();
        let before = list.clone();
        assert_eq!(add_task(&mut list, "", Priority::Low, at(10)), Err(TaskError::EmptyText));
        assert_eq!(add_task(&mut list, "   ", Priority::High, at(10)), Err(TaskError::EmptyText));
        assert_eq!(list, before);
    }

    #[test]
    fn test_add_task_same_millisecond_gets_unique_ids() {
        let mut list = TaskList::new();
        let a = add_task(&mut list, "a", Priority::Low, at(0)).unwrap();
        let b = add_task(&mut list, "b", Priority::Low, at(0)).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut list = sample_list();
        let id = list.tasks[0].id;
        assert!(toggle_task(&mut list, id, at(10)).unwrap());
        assert_eq!(list.get(id).unwrap().updated_at, at(10));
        assert!(!toggle_task(&mut list, id, at(11)).unwrap());
        assert!(!list.get(id).unwrap().completed);
        assert_eq!(list.get(id).unwrap().updated_at, at(11));
    }

    #[test]
    fn test_toggle_missing_id() {
        let mut list = sample_list();
        let before = list.clone();
        assert_eq!(
            toggle_task(&mut list, TaskId(42), at(10)),
            Err(TaskError::NotFound(TaskId(42)))
        );
        assert_eq!(list, before);
    }

    #[test]
    fn test_edit_text() {
        let mut list = sample_list();
        let id = list.tasks[1].id;
        edit_text(&mut list, id, " Renamed ", at(10)).unwrap();
        let task = list.get(id).unwrap();
        assert_eq!(task.text, "Renamed");
        assert_eq!(task.updated_at, at(10));
        assert_eq!(task.created_at, at(1));
    }

    #[test]
    fn test_edit_blank_text_is_noop() {
        let mut list = sample_list();
        let before = list.clone();
        let id = list.tasks[0].id;
        assert_eq!(edit_text(&mut list, id, "  ", at(10)), Err(TaskError::EmptyText));
        assert_eq!(list, before);
    }

    #[test]
    fn test_remove_task() {
        let mut list = sample_list();
        let id = list.tasks[1].id;
        let removed = remove_task(&mut list, id).unwrap();
        assert_eq!(removed.text, "Second");
        assert_eq!(texts(&list), vec!["Third", "First"]);
        assert!(remove_task(&mut list, id).is_err());
    }

    #[test]
    fn test_duplicate_task() {
        let mut list = sample_list();
        let source = list.tasks[1].clone();
        let copy_id = duplicate_task(&mut list, source.id, at(10)).unwrap();
        assert_ne!(copy_id, source.id);
        let copy = &list.tasks[0];
        assert_eq!(copy.id, copy_id);
        assert_eq!(copy.text, "Second (Copy)");
        assert_eq!(copy.priority, Priority::High);
        assert!(!copy.completed);
        assert_eq!(copy.created_at, at(10));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_cycle_priority_three_times_returns_to_start() {
        let mut list = sample_list();
        let id = list.tasks[0].id;
        let original = list.tasks[0].priority;
        cycle_priority(&mut list, id, at(10)).unwrap();
        cycle_priority(&mut list, id, at(11)).unwrap();
        assert_ne!(list.get(id).unwrap().priority, original);
        assert_eq!(cycle_priority(&mut list, id, at(12)).unwrap(), original);
        assert_eq!(list.get(id).unwrap().updated_at, at(12));
    }

    // --- Bulk ---

    #[test]
    fn test_clear_completed() {
        let mut list = sample_list();
        assert_eq!(clear_completed(&mut list), 1);
        assert_eq!(texts(&list), vec!["Third", "First"]);
        assert_eq!(clear_completed(&mut list), 0);
    }

    #[test]
    fn test_clear_all() {
        let mut list = sample_list();
        assert_eq!(clear_all(&mut list), 3);
        assert!(list.is_empty());
        assert_eq!(clear_all(&mut list), 0);
    }

    // --- Ordering ---

    #[test]
    fn test_reorder_full_order() {
        let mut list = sample_list();
        let mut order = ids(&list);
        order.reverse();
        assert!(reorder(&mut list, &order));
        assert_eq!(texts(&list), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_reorder_partial_order_appends_rest() {
        let mut list = sample_list();
        let first = list.tasks[2].id;
        assert!(reorder(&mut list, &[first]));
        assert_eq!(texts(&list), vec!["First", "Third", "Second"]);
    }

    #[test]
    fn test_reorder_ignores_unknown_and_duplicate_ids() {
        let mut list = sample_list();
        let first = list.tasks[2].id;
        let second = list.tasks[1].id;
        assert!(reorder(&mut list, &[TaskId(1), second, first, second]));
        assert_eq!(texts(&list), vec!["Second", "First", "Third"]);
    }

    #[test]
    fn test_reorder_same_order_reports_unchanged() {
        let mut list = sample_list();
        let order = ids(&list);
        assert!(!reorder(&mut list, &order));
        assert!(!reorder(&mut list, &[]));
    }

    #[test]
    fn test_move_task_positions() {
        let mut list = sample_list();
        let first = list.tasks[2].id;
        let third = list.tasks[0].id;

        assert!(move_task(&mut list, first, InsertPosition::Top).unwrap());
        assert_eq!(texts(&list), vec!["First", "Third", "Second"]);

        assert!(move_task(&mut list, first, InsertPosition::Bottom).unwrap());
        assert_eq!(texts(&list), vec!["Third", "Second", "First"]);

        assert!(move_task(&mut list, first, InsertPosition::After(third)).unwrap());
        assert_eq!(texts(&list), vec!["Third", "First", "Second"]);

        assert!(!move_task(&mut list, first, InsertPosition::After(third)).unwrap());
        assert!(!move_task(&mut list, first, InsertPosition::After(first)).unwrap());
    }

    #[test]
    fn test_move_task_unknown_target() {
        let mut list = sample_list();
        let first = list.tasks[2].id;
        let before = list.clone();
        assert_eq!(
            move_task(&mut list, first, InsertPosition::After(TaskId(7))),
            Err(TaskError::NotFound(TaskId(7)))
        );
        assert_eq!(list, before);
    }
}
