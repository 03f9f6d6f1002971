use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::{Notice, NoticeLevel};
use crate::model::task::Task;
use crate::model::view::{Filter, SortOrder};
use crate::ops::stats::Stats;
use crate::util::unicode::{fit_to_width, single_line};

/// Width of the text column in list output
const TEXT_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ListJson<'a> {
    pub filter: Filter,
    pub sort: SortOrder,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub search: &'a str,
    pub tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
pub struct StatsJson {
    #[serde(flatten)]
    pub stats: Stats,
    pub percent_complete: f64,
}

impl From<Stats> for StatsJson {
    fn from(stats: Stats) -> Self {
        StatsJson {
            stats,
            percent_complete: stats.completion_percent(),
        }
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One row of list output: checkbox, id, priority, text, age
pub fn format_task_line(task: &Task, now: DateTime<Utc>) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let text = fit_to_width(&single_line(&task.text), TEXT_WIDTH);
    format!(
        "{} {}  {:<6}  {}  {}",
        check,
        task.id,
        task.priority.as_str(),
        text,
        format_relative_date(task.created_at, now)
    )
    .trim_end()
    .to_string()
}

/// All rows, or a placeholder line when the view is empty
pub fn format_task_list(tasks: &[&Task], now: DateTime<Utc>) -> String {
    if tasks.is_empty() {
        return "No tasks.".to_string();
    }
    tasks
        .iter()
        .map(|t| format_task_line(t, now))
        .collect::<Vec<_>>()
        .join("\n")
}

/// "today", "yesterday", "3 days ago", or the date after a week
pub fn format_relative_date(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - date).num_days();
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

pub fn format_stats(stats: &Stats) -> String {
    format!(
        "{} total: {} active, {} completed ({:.0}%)\nhigh {} · medium {} · low {}",
        stats.total,
        stats.active,
        stats.completed,
        stats.completion_percent(),
        stats.high,
        stats.medium,
        stats.low
    )
}

/// Notice text as printed; warnings carry a prefix
pub fn format_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Warning => format!("warning: {}", notice.message),
        NoticeLevel::Success | NoticeLevel::Info => notice.message.clone(),
    }
}
