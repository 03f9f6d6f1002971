use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TASKDECK_DATA_DIR";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Default config file, respecting XDG_CONFIG_HOME
pub fn default_config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".config"));
    config_dir.join("taskdeck").join("config.toml")
}

/// Default data directory, respecting XDG_DATA_HOME
pub fn default_data_dir() -> PathBuf {
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".local").join("share"));
    data_dir.join("taskdeck")
}

/// Get the user's home directory
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Parse a config file.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config. An explicitly given file must exist; the default
/// location is optional and falls back to defaults when absent.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                read_config(&path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Pick the data directory: flag, then environment, then config, then default.
pub fn resolve_data_dir(flag: Option<&Path>, env_value: Option<&str>, config: &Config) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    if let Some(dir) = env_value.filter(|v| !v.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    config
        .storage
        .data_dir
        .clone()
        .unwrap_or_else(default_data_dir)
}
