use serde::Serialize;

use crate::model::task::{Priority, TaskList};

/// Task counts over the whole list (ignores the current filter)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl Stats {
    /// Share of completed tasks, 0–100. Zero for an empty list.
    pub fn completion_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }
}

pub fn compute_stats(list: &TaskList) -> Stats {
    let mut stats = Stats {
        total: list.len(),
        ..Default::default()
    };
    for task in list.iter() {
        if task.completed {
            stats.completed += 1;
        } else {
            stats.active += 1;
        }
        match task.priority {
            Priority::High => stats.high += 1,
            Priority::Medium => stats.medium += 1,
            Priority::Low => stats.low += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::task_ops::{add_task, toggle_task};
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_list_has_zero_percent() {
        let stats = compute_stats(&TaskList::new());
        assert_eq!(stats, Stats::default());
        assert_eq!(stats.completion_percent(), 0.0);
    }

    #[test]
    fn counts_state_and_priority() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut list = TaskList::new();
        let a = add_task(&mut list, "a", Priority::High, now).unwrap();
        add_task(&mut list, "b", Priority::Low, now).unwrap();
        add_task(&mut list, "c", Priority::Low, now).unwrap();
        add_task(&mut list, "d", Priority::Medium, now).unwrap();
        toggle_task(&mut list, a, now).unwrap();

        let stats = compute_stats(&list);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!((stats.high, stats.medium, stats.low), (1, 1, 2));
        assert_eq!(stats.completion_percent(), 25.0);
    }
}
