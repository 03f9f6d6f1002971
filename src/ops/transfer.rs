use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::model::task::{Priority, Task, TaskId, TaskList};

/// Error type for import operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("invalid import format: {0}")]
    InvalidFormat(String),
}

/// Result of an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    /// Number of tasks appended
    pub count: usize,
    /// (incoming id, assigned id) for records whose id was already taken
    pub reassigned: Vec<(TaskId, TaskId)>,
}

/// A task-shaped record as found in an import file.
/// Only `id` and `text` are required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRecord {
    id: i64,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Validate an import payload. Either every record is task-shaped and the
/// tasks are returned, or nothing is.
pub fn parse_import(json: &str, now: DateTime<Utc>) -> Result<Vec<Task>, ImportError> {
    parse_array(json)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| decode_record(i, item, now))
        .collect()
}

/// Rebuild a list from previously saved data.
///
/// Unlike an import, a record that can't be read is skipped instead of
/// failing the whole list, and duplicate ids are reassigned. Only a value
/// that is not an array at all is an error.
pub fn recover_list(json: &str, now: DateTime<Utc>) -> Result<Recovered, ImportError> {
    let mut tasks = Vec::new();
    let mut skipped = 0;
    for (i, item) in parse_array(json)?.into_iter().enumerate() {
        match decode_record(i, item, now) {
            Ok(task) => tasks.push(task),
            Err(e) => {
                warn!(error = %e, "skipping unreadable saved task");
                skipped += 1;
            }
        }
    }
    let mut list = TaskList::new();
    let merged = import_merge(&mut list, tasks, now);
    Ok(Recovered {
        list,
        skipped,
        reassigned: merged.reassigned,
    })
}

/// A list rebuilt by `recover_list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub list: TaskList,
    /// Records dropped because they were not task-shaped
    pub skipped: usize,
    /// (saved id, assigned id) for duplicate ids
    pub reassigned: Vec<(TaskId, TaskId)>,
}

fn parse_array(json: &str) -> Result<Vec<serde_json::Value>, ImportError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ImportError::InvalidFormat(format!("not valid JSON: {e}")))?;
    match value {
        serde_json::Value::Array(items) => Ok(items),
        _ => Err(ImportError::InvalidFormat("expected a JSON array of tasks".into())),
    }
}

/// Turn record `i` into a task, filling defaults for optional fields.
fn decode_record(i: usize, item: serde_json::Value, now: DateTime<Utc>) -> Result<Task, ImportError> {
    let record: ImportRecord =
        serde_json::from_value(item).map_err(|e| ImportError::InvalidFormat(format!("record {i}: {e}")))?;
    if record.text.trim().is_empty() {
        return Err(ImportError::InvalidFormat(format!("record {i}: empty text")));
    }
    let created_at = record.created_at.unwrap_or(now);
    Ok(Task {
        id: TaskId(record.id),
        text: record.text,
        completed: record.completed,
        priority: record.priority,
        created_at,
        updated_at: record.updated_at.unwrap_or(created_at),
    })
}

/// Append validated tasks to the end of the list.
///
/// Content is not deduplicated. An id that is already taken (by the list or
/// an earlier task of the same batch) is replaced with a fresh one.
pub fn import_merge(list: &mut TaskList, tasks: Vec<Task>, now: DateTime<Utc>) -> ImportResult {
    let mut taken: HashSet<TaskId> = list.iter().map(|t| t.id).collect();
    let mut reassigned = Vec::new();
    let count = tasks.len();

    for mut task in tasks {
        if taken.contains(&task.id) {
            let fresh = list.next_id(now);
            reassigned.push((task.id, fresh));
            task.id = fresh;
        }
        taken.insert(task.id);
        list.tasks.push(task);
    }

    ImportResult { count, reassigned }
}

/// Parse and merge in one step. On error the list is untouched.
pub fn import_json(list: &mut TaskList, json: &str, now: DateTime<Utc>) -> Result<ImportResult, ImportError> {
    let tasks = parse_import(json, now)?;
    Ok(import_merge(list, tasks, now))
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Pretty-printed JSON array of the full list
pub fn export_json(list: &TaskList) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&list.tasks)
}

/// Default export file name: `todos-YYYY-MM-DD.json`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("todos-{}.json", now.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::task_ops::{add_task, toggle_task};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn sample_list() -> TaskList {
        let mut list = TaskList::new();
        add_task(&mut list, "Buy milk", Priority::Low, at(0)).unwrap();
        let id = add_task(&mut list, "Pay bills", Priority::High, at(1)).unwrap();
        toggle_task(&mut list, id, at(2)).unwrap();
        list
    }

    #[test]
    fn export_then_import_into_empty_list_reproduces_it() {
        let list = sample_list();
        let json = export_json(&list).unwrap();

        let mut restored = TaskList::new();
        let result = import_json(&mut restored, &json, at(100)).unwrap();
        assert_eq!(result.count, 2);
        assert!(result.reassigned.is_empty());
        assert_eq!(restored, list);
    }

    #[test]
    fn import_appends_to_end() {
        let mut list = sample_list();
        let json = r#"[{"id": 1, "text": "Imported"}]"#;
        import_json(&mut list, json, at(100)).unwrap();
        assert_eq!(list.tasks.last().unwrap().text, "Imported");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn import_fills_defaults() {
        let tasks = parse_import(r#"[{"id": 7, "text": "bare"}]"#, at(100)).unwrap();
        let task = &tasks[0];
        assert_eq!(task.id, TaskId(7));
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.created_at, at(100));
        assert_eq!(task.updated_at, at(100));
    }

    #[test]
    fn import_rejects_non_array() {
        let mut list = sample_list();
        let before = list.clone();
        for payload in ["not an array", r#""not an array""#, r#"{"id": 1, "text": "x"}"#, "42"] {
            let err = import_json(&mut list, payload, at(100)).unwrap_err();
            assert!(matches!(err, ImportError::InvalidFormat(_)), "payload {payload}");
        }
        assert_eq!(list, before);
    }

    #[test]
    fn import_rejects_malformed_record_without_partial_merge() {
        let mut list = sample_list();
        let before = list.clone();
        let json = r#"[{"id": 1, "text": "fine"}, {"text": "missing id"}]"#;
        let err = import_json(&mut list, json, at(100)).unwrap_err();
        assert!(err.to_string().contains("record 1"));
        assert_eq!(list, before);
    }

    #[test]
    fn import_rejects_blank_text_and_bad_priority() {
        assert!(parse_import(r#"[{"id": 1, "text": "  "}]"#, at(0)).is_err());
        assert!(parse_import(r#"[{"id": 1, "text": "x", "priority": "urgent"}]"#, at(0)).is_err());
    }

    #[test]
    fn import_reassigns_colliding_ids() {
        let mut list = sample_list();
        let taken = list.tasks[0].id;
        let json = format!(r#"[{{"id": {taken}, "text": "clash"}}, {{"id": 5, "text": "a"}}, {{"id": 5, "text": "b"}}]"#);
        let result = import_json(&mut list, &json, at(100)).unwrap();

        assert_eq!(result.count, 3);
        assert_eq!(result.reassigned.len(), 2);
        assert_eq!(result.reassigned[0].0, taken);
        let ids: HashSet<TaskId> = list.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), list.len());
        assert_eq!(list.tasks[3].id, TaskId(5));
    }

    #[test]
    fn import_at_largest_id_leaves_room_for_more() {
        let mut list = TaskList::new();
        let json = r#"[{"id": 9223372036854775807, "text": "big"}, {"id": 9223372036854775807, "text": "again"}]"#;
        let result = import_json(&mut list, json, at(100)).unwrap();
        assert_eq!(result.reassigned.len(), 1);

        add_task(&mut list, "after", Priority::Low, at(101)).unwrap();
        add_task(&mut list, "and again", Priority::Low, at(101)).unwrap();
        let ids: HashSet<TaskId> = list.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 4);
        assert!(list.contains(TaskId(i64::MAX)));
    }

    #[test]
    fn recover_fills_missing_fields() {
        let json = r#"[{"id": 1, "text": "keep me", "completed": false, "createdAt": "2024-01-01T00:00:00Z"}]"#;
        let recovered = recover_list(json, at(100)).unwrap();
        assert_eq!(recovered.skipped, 0);
        let task = &recovered.list.tasks[0];
        assert_eq!(task.text, "keep me");
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.updated_at, task.created_at);
        assert_eq!(task.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn recover_skips_bad_records_and_keeps_the_rest() {
        let json = r#"[{"id": 1, "text": "good"}, {"text": "no id"}, {"id": 2, "text": "  "}, {"id": 3, "text": "also good"}]"#;
        let recovered = recover_list(json, at(100)).unwrap();
        assert_eq!(recovered.skipped, 2);
        let texts: Vec<_> = recovered.list.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["good", "also good"]);
    }

    #[test]
    fn recover_reassigns_duplicate_ids() {
        let json = r#"[{"id": 1, "text": "first"}, {"id": 1, "text": "second"}]"#;
        let recovered = recover_list(json, at(100)).unwrap();
        assert_eq!(recovered.list.tasks[0].id, TaskId(1));
        assert_ne!(recovered.list.tasks[1].id, TaskId(1));
        assert_eq!(recovered.reassigned, vec![(TaskId(1), recovered.list.tasks[1].id)]);
    }

    #[test]
    fn recover_rejects_non_array() {
        assert!(recover_list(r#"{"id": 1}"#, at(0)).is_err());
        assert!(recover_list("{ not json", at(0)).is_err());
    }

    #[test]
    fn import_empty_array_is_ok() {
        let mut list = sample_list();
        let result = import_json(&mut list, "[]", at(0)).unwrap();
        assert_eq!(result.count, 0);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn export_is_pretty_printed() {
        let mut list = TaskList::new();
        add_task(&mut list, "Only", Priority::Medium, at(0)).unwrap();
        insta::assert_snapshot!(export_json(&list).unwrap(), @r#"
        [
          {
            "id": 1700000000000,
            "text": "Only",
            "completed": false,
            "priority": "medium",
            "createdAt": "2023-11-14T22:13:20Z",
            "updatedAt": "2023-11-14T22:13:20Z"
          }
        ]
        "#);
    }

    #[test]
    fn export_file_name_uses_utc_date() {
        assert_eq!(export_file_name(at(0)), "todos-2023-11-14.json");
    }
}
