use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Error type for key-value storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("could not encode value for {key}: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

/// String key-value storage, the shape of browser local storage.
pub trait KvStore {
    /// Read a value. `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// Directory-backed store
// ---------------------------------------------------------------------------

/// One file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl KvStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Write {
            path: self.dir.clone(),
            source,
        })?;
        atomic_write(&path, value.as_bytes()).map_err(|source| StorageError::Write { path, source })
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Map-backed store. With a quota, writes that would push the total stored
/// bytes over it fail the way a full browser storage does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        MemoryStore {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
