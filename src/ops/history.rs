use crate::model::task::TaskList;

/// Default number of undo steps kept
pub const HISTORY_LIMIT: usize = 50;

/// A full copy of the task list at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(TaskList);

impl Snapshot {
    pub fn capture(list: &TaskList) -> Self {
        Snapshot(list.clone())
    }

    /// True if `list` is unchanged since capture
    pub fn matches(&self, list: &TaskList) -> bool {
        self.0 == *list
    }

    pub fn into_list(self) -> TaskList {
        self.0
    }
}

/// Linear undo/redo history built from whole-list snapshots.
///
/// Recording a new snapshot discards the redo branch.
#[derive(Debug, Clone)]
pub struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    /// History keeping at most `limit` steps in each direction (minimum 1)
    pub fn with_limit(limit: usize) -> Self {
        History {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record the state before a mutation. Clears the redo stack.
    pub fn snapshot(&mut self, list: &TaskList) {
        self.record(Snapshot::capture(list));
    }

    /// Record an already captured snapshot. Clears the redo stack.
    pub fn record(&mut self, snapshot: Snapshot) {
        push_bounded(&mut self.undo, snapshot, self.limit);
        self.redo.clear();
    }

    /// Step back. Returns false (and leaves `list` alone) if there is nothing to undo.
    pub fn undo(&mut self, list: &mut TaskList) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        let current = std::mem::replace(list, previous.into_list());
        push_bounded(&mut self.redo, Snapshot(current), self.limit);
        true
    }

    /// Step forward again. Returns false if there is nothing to redo.
    pub fn redo(&mut self, list: &mut TaskList) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(list, next.into_list());
        push_bounded(&mut self.undo, Snapshot(current), self.limit);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

fn push_bounded(stack: &mut Vec<Snapshot>, snapshot: Snapshot, limit: usize) {
    stack.push(snapshot);
    if stack.len() > limit {
        stack.drain(..stack.len() - limit);
    }
}
