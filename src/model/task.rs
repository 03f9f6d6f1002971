use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// The next priority in the cycle: low → medium → high → low
    pub fn next(self) -> Priority {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }

    /// Sort rank, most urgent first
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other} (expected low, medium or high)")),
        }
    }
}

/// Task identifier. Derived from the creation time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TaskId)
    }
}

/// A single to-do item. Field names match the persisted JSON records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create an open task stamped with `now`. `text` is stored as given.
    pub fn new(id: TaskId, text: String, priority: Priority, now: DateTime<Utc>) -> Self {
        Task {
            id,
            text,
            completed: false,
            priority,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// The ordered task collection. Index 0 is the top of the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        TaskList { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.position(id).is_some()
    }

    pub fn max_id(&self) -> Option<TaskId> {
        self.tasks.iter().map(|t| t.id).max()
    }

    /// Allocate an id for a task created at `now`: the creation millisecond,
    /// bumped past every id already present. When the largest id has no
    /// headroom left, the first free id from `now` onwards is used instead.
    pub fn next_id(&self, now: DateTime<Utc>) -> TaskId {
        let stamp = now.timestamp_millis();
        match self.max_id() {
            Some(TaskId(max)) if max >= stamp => match max.checked_add(1) {
                Some(next) => TaskId(next),
                None => self.first_free_id(stamp),
            },
            _ => TaskId(stamp),
        }
    }

    /// Lowest unused id at or above `from`, wrapping into the negative range.
    fn first_free_id(&self, from: i64) -> TaskId {
        let taken: HashSet<i64> = self.tasks.iter().map(|t| t.id.0).collect();
        (from..=i64::MAX)
            .chain(i64::MIN..from)
            .find(|id| !taken.contains(id))
            .map(TaskId)
            // a list can't hold every i64
            .unwrap_or(TaskId(from))
    }
}
