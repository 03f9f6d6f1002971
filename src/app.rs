use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::io::persist::Persistence;
use crate::io::storage::{KvStore, StorageError};
use crate::model::config::Config;
use crate::model::task::{Priority, Task, TaskId, TaskList};
use crate::model::view::{Filter, SortOrder, ViewState};
use crate::ops::history::{History, Snapshot};
use crate::ops::query;
use crate::ops::stats::{compute_stats, Stats};
use crate::ops::task_ops::{self, InsertPosition, TaskError};
use crate::ops::transfer::{self, ImportError, ImportResult};
use crate::util::timing::{AutoSave, Debouncer};

/// Error type for controller commands
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("could not encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("name cannot be empty")]
    EmptyName,
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
}

/// Feedback for the user after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Notice {
            level,
            message: message.into(),
        }
    }
}

/// Tunables the controller takes from config
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub history_limit: usize,
    pub autosave_interval: Duration,
    pub search_debounce: Duration,
    pub view: ViewState,
}

impl Default for AppOptions {
    fn default() -> Self {
        AppOptions::from(&Config::default())
    }
}

impl From<&Config> for AppOptions {
    fn from(config: &Config) -> Self {
        AppOptions {
            history_limit: config.history.limit,
            autosave_interval: Duration::from_secs(config.autosave.interval_secs),
            search_debounce: Duration::from_millis(config.search.debounce_ms),
            view: ViewState {
                filter: config.view.filter,
                sort: config.view.sort,
                ..Default::default()
            },
        }
    }
}

/// Application state and the commands that change it.
///
/// Every successful mutation snapshots the previous list into history,
/// then saves. A failed save becomes a warning notice; the change stays.
pub struct App<S> {
    tasks: TaskList,
    history: History,
    view: ViewState,
    user_name: String,
    persistence: Persistence<S>,
    autosave: AutoSave,
    search_input: Debouncer<String>,
    /// In-memory state differs from what was last saved
    dirty: bool,
    notices: Vec<Notice>,
}

impl<S: KvStore> App<S> {
    /// Load saved state from `store`.
    pub fn open(store: S, options: &AppOptions) -> Self {
        let persistence = Persistence::new(store);
        let tasks = persistence.load_tasks();
        let user_name = persistence.load_user_name();
        debug!(tasks = tasks.len(), "app opened");
        App {
            tasks,
            history: History::with_limit(options.history_limit),
            view: options.view.clone(),
            user_name,
            persistence,
            autosave: AutoSave::new(options.autosave_interval, Instant::now()),
            search_input: Debouncer::new(options.search_debounce),
            dirty: false,
            notices: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The filtered, searched and sorted list for display
    pub fn view(&self) -> Vec<&Task> {
        query::view_for(&self.tasks, &self.view)
    }

    pub fn stats(&self) -> Stats {
        compute_stats(&self.tasks)
    }

    /// Drain pending notices, oldest first
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -----------------------------------------------------------------------
    // Task commands
    // -----------------------------------------------------------------------

    /// Add a task. Without an explicit priority the pending one is used,
    /// and the pending priority resets to low afterwards.
    pub fn add(&mut self, text: &str, priority: Option<Priority>) -> Result<TaskId, AppError> {
        let priority = priority.unwrap_or(self.view.pending_priority);
        let id = self.apply(|list, now| task_ops::add_task(list, text, priority, now))?;
        self.view.pending_priority = Priority::Low;
        self.notify(NoticeLevel::Success, "Task added");
        Ok(id)
    }

    /// Returns the new completion state.
    pub fn toggle(&mut self, id: TaskId) -> Result<bool, AppError> {
        let completed = self.apply(|list, now| task_ops::toggle_task(list, id, now))?;
        self.notify(
            NoticeLevel::Success,
            if completed { "Task completed" } else { "Task reopened" },
        );
        Ok(completed)
    }

    pub fn edit(&mut self, id: TaskId, text: &str) -> Result<(), AppError> {
        self.apply(|list, now| task_ops::edit_text(list, id, text, now))?;
        self.notify(NoticeLevel::Success, "Task updated");
        Ok(())
    }

    pub fn remove(&mut self, id: TaskId) -> Result<Task, AppError> {
        let task = self.apply(|list, _| task_ops::remove_task(list, id))?;
        self.notify(NoticeLevel::Info, "Task deleted");
        Ok(task)
    }

    pub fn duplicate(&mut self, id: TaskId) -> Result<TaskId, AppError> {
        let new_id = self.apply(|list, now| task_ops::duplicate_task(list, id, now))?;
        self.notify(NoticeLevel::Success, "Task duplicated");
        Ok(new_id)
    }

    pub fn cycle_priority(&mut self, id: TaskId) -> Result<Priority, AppError> {
        let priority = self.apply(|list, now| task_ops::cycle_priority(list, id, now))?;
        self.notify(NoticeLevel::Info, format!("Priority changed to {priority}"));
        Ok(priority)
    }

    pub fn clear_completed(&mut self) -> usize {
        let count = self.apply_infallible(task_ops::clear_completed);
        if count == 0 {
            self.notify(NoticeLevel::Info, "No completed tasks to clear");
        } else {
            self.notify(
                NoticeLevel::Success,
                format!("{} cleared", plural(count, "completed task")),
            );
        }
        count
    }

    /// Delete every task. The caller is responsible for confirming first.
    pub fn clear_all(&mut self) -> usize {
        let count = self.apply_infallible(task_ops::clear_all);
        if count == 0 {
            self.notify(NoticeLevel::Info, "No tasks to delete");
        } else {
            self.notify(NoticeLevel::Info, format!("All {} deleted", plural(count, "task")));
        }
        count
    }

    /// Commit a manual order. Returns true if anything moved.
    pub fn reorder(&mut self, order: &[TaskId]) -> bool {
        let changed = self.apply_infallible(|list| task_ops::reorder(list, order));
        self.notify_moved(changed);
        changed
    }

    pub fn move_task(&mut self, id: TaskId, position: InsertPosition) -> Result<bool, AppError> {
        let changed = self.apply(|list, _| task_ops::move_task(list, id, position))?;
        self.notify_moved(changed);
        Ok(changed)
    }

    /// Merge tasks from a JSON export. Nothing changes on a format error.
    pub fn import_json(&mut self, json: &str) -> Result<ImportResult, AppError> {
        let result = self.apply(|list, now| transfer::import_json(list, json, now))?;
        self.notify(
            NoticeLevel::Success,
            format!("{} imported", plural(result.count, "task")),
        );
        Ok(result)
    }

    /// Pretty-printed JSON of the whole list
    pub fn export_json(&self) -> Result<String, AppError> {
        Ok(transfer::export_json(&self.tasks)?)
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.tasks);
        if undone {
            self.persist();
            self.notify(NoticeLevel::Info, "Action undone");
        } else {
            self.notify(NoticeLevel::Info, "Nothing to undo");
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.tasks);
        if redone {
            self.persist();
            self.notify(NoticeLevel::Info, "Action redone");
        } else {
            self.notify(NoticeLevel::Info, "Nothing to redo");
        }
        redone
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    pub fn set_filter(&mut self, filter: Filter) {
        self.view.filter = filter;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.view.sort = sort;
    }

    /// Apply a search query now, dropping any debounced input.
    pub fn set_search(&mut self, query: &str) {
        self.search_input.flush();
        self.view.search = query.to_string();
    }

    /// Queue a search query; `tick` applies it once input has gone quiet.
    ///
    /// For front ends that feed the query per keystroke. Callers with a
    /// complete query, like `td shell`, use `set_search`.
    pub fn set_search_debounced(&mut self, query: &str, now: Instant) {
        self.search_input.input(query.to_string(), now);
    }

    pub fn set_pending_priority(&mut self, priority: Priority) {
        self.view.pending_priority = priority;
    }

    // -----------------------------------------------------------------------
    // User name
    // -----------------------------------------------------------------------

    /// Store a new display name. Blank names are rejected.
    pub fn set_user_name(&mut self, name: &str) -> Result<(), AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::EmptyName);
        }
        self.user_name = name.to_string();
        match self.persistence.save_user_name(name) {
            Ok(_) => self.notify(NoticeLevel::Success, "Name updated"),
            Err(e) => self.storage_warning(&e),
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Timers and lifecycle
    // -----------------------------------------------------------------------

    /// Drive time-based work: settle debounced search and auto-save.
    /// Returns true if the view query changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut view_changed = false;
        if let Some(query) = self.search_input.poll(now) {
            view_changed = query != self.view.search;
            self.view.search = query;
        }
        if self.autosave.is_due(now) {
            if self.dirty {
                debug!("auto-saving");
                self.persist();
            }
            self.autosave.mark_saved(now);
        }
        view_changed
    }

    /// Final save before exit.
    pub fn shutdown(&mut self) -> Result<(), StorageError> {
        self.persistence.save_tasks(&self.tasks)?;
        self.dirty = false;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Run a mutation. On success the change is committed.
    fn apply<T, E>(&mut self, op: impl FnOnce(&mut TaskList, DateTime<Utc>) -> Result<T, E>) -> Result<T, AppError>
    where
        AppError: From<E>,
    {
        let before = Snapshot::capture(&self.tasks);
        let value = op(&mut self.tasks, Utc::now())?;
        self.commit(before);
        Ok(value)
    }

    fn apply_infallible<T>(&mut self, op: impl FnOnce(&mut TaskList) -> T) -> T {
        let before = Snapshot::capture(&self.tasks);
        let value = op(&mut self.tasks);
        self.commit(before);
        value
    }

    /// If the list changed, push the previous state onto the undo stack and save.
    fn commit(&mut self, before: Snapshot) {
        if before.matches(&self.tasks) {
            return;
        }
        self.history.record(before);
        self.persist();
    }

    fn persist(&mut self) {
        match self.persistence.save_tasks(&self.tasks) {
            Ok(()) => {
                self.dirty = false;
                self.autosave.mark_saved(Instant::now());
            }
            Err(e) => {
                self.dirty = true;
                self.storage_warning(&e);
            }
        }
    }

    fn storage_warning(&mut self, e: &StorageError) {
        warn!(error = %e, "save failed, changes are kept in memory");
        self.notify(NoticeLevel::Warning, format!("Could not save: {e}"));
    }

    fn notify_moved(&mut self, changed: bool) {
        if changed {
            self.notify(NoticeLevel::Success, "Task moved");
        } else {
            self.notify(NoticeLevel::Info, "Order unchanged");
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice::new(level, message));
    }
}

/// "1 task", "3 tasks"
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
