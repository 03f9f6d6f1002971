use chrono::Utc;
use tracing::{debug, warn};

use crate::io::storage::{KvStore, StorageError};
use crate::model::task::TaskList;
use crate::ops::transfer;

/// Storage key holding the JSON task array
pub const TODOS_KEY: &str = "todos";
/// Storage key holding the user's display name
pub const USER_NAME_KEY: &str = "userName";

/// Loads and saves application state through a key-value store.
///
/// Loading never fails: missing or unreadable data comes back empty, and
/// individual unreadable records are dropped without losing the rest.
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KvStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Persistence { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn load_tasks(&self) -> TaskList {
        let raw = match self.store.get(TODOS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return TaskList::new(),
            Err(e) => {
                warn!(error = %e, "could not read saved tasks, starting empty");
                return TaskList::new();
            }
        };
        match transfer::recover_list(&raw, Utc::now()) {
            Ok(recovered) => {
                if recovered.skipped > 0 || !recovered.reassigned.is_empty() {
                    warn!(
                        skipped = recovered.skipped,
                        reassigned = recovered.reassigned.len(),
                        "repaired saved tasks"
                    );
                }
                debug!(count = recovered.list.len(), "loaded tasks");
                recovered.list
            }
            Err(e) => {
                warn!(error = %e, "saved tasks are corrupt, starting empty");
                TaskList::new()
            }
        }
    }

    pub fn save_tasks(&mut self, list: &TaskList) -> Result<(), StorageError> {
        let json = serde_json::to_string(&list.tasks).map_err(|source| StorageError::Encode {
            key: TODOS_KEY.to_string(),
            source,
        })?;
        self.store.set(TODOS_KEY, &json)?;
        debug!(count = list.len(), "saved tasks");
        Ok(())
    }

    /// The saved display name, or an empty string
    pub fn load_user_name(&self) -> String {
        match self.store.get(USER_NAME_KEY) {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "could not read user name");
                String::new()
            }
        }
    }

    /// Save the trimmed name. Returns what was stored.
    pub fn save_user_name(&mut self, name: &str) -> Result<String, StorageError> {
        let name = name.trim();
        self.store.set(USER_NAME_KEY, name)?;
        Ok(name.to_string())
    }
}
