use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::view::{Filter, SortOrder};

/// Configuration from config.toml. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub autosave: AutoSaveConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where the task store lives. None = platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoSaveConfig {
    #[serde(default = "default_autosave_secs")]
    pub interval_secs: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        AutoSaveConfig {
            interval_secs: default_autosave_secs(),
        }
    }
}

fn default_autosave_secs() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub sort: SortOrder,
}
