//! Key/value persistence used by the cache layer and the language preference.
//!
//! The store only needs string keys mapped to string values that survive a
//! restart. [`FileStorage`] keeps them in a single JSON object on disk;
//! [`MemoryStorage`] is a process-local stand-in.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::i18n::error::TranslationError;

/// Persisted string key/value storage.
pub trait KeyValueStorage: Send + Sync {
    /// What: Read the value stored under `key`.
    ///
    /// # Errors
    /// - Returns a `Storage` error when the backend cannot be read
    fn get(&self, key: &str) -> Result<Option<String>, TranslationError>;

    /// What: Store `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    /// - Returns a `Storage` error when the value cannot be persisted
    fn set(&self, key: &str, value: &str) -> Result<(), TranslationError>;

    /// What: Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// - Returns a `Storage` error when the removal cannot be persisted
    fn remove(&self, key: &str) -> Result<(), TranslationError>;

    /// What: List every stored key.
    ///
    /// # Errors
    /// - Returns a `Storage` error when the backend cannot be read
    fn keys(&self) -> Result<Vec<String>, TranslationError>;
}

/// Lock a storage map, recovering the data if a previous holder panicked.
fn lock(map: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    map.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// In-memory storage; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, TranslationError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TranslationError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TranslationError> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, TranslationError> {
        Ok(lock(&self.entries).keys().cloned().collect())
    }
}

/// Storage persisted as one JSON object file.
///
/// Every mutation rewrites the file through a temporary sibling and a rename.
/// When the write fails the in-memory view is rolled back, so a failed `set`
/// leaves no trace.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// What: Open (or lazily create) a storage file.
    ///
    /// Inputs:
    /// - `path`: JSON file location; parent directories are created on first write
    ///
    /// Output:
    /// - `FileStorage` seeded with the file's contents
    ///
    /// Details:
    /// - A missing file starts empty
    /// - A corrupt or unreadable file is logged and also starts empty; it is
    ///   replaced on the next successful write
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "storage file is corrupt, starting empty"
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read storage file, starting empty"
                );
                BTreeMap::new()
            }
        };
        tracing::debug!(path = %path.display(), keys = entries.len(), "opened storage file");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole map to disk.
    fn persist(
        &self,
        entries: &BTreeMap<String, String>,
        key: &str,
    ) -> Result<(), TranslationError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| TranslationError::storage(key, e))?;
        write_atomic(&self.path, json.as_bytes()).map_err(|e| TranslationError::storage(key, e))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, TranslationError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TranslationError> {
        let mut entries = lock(&self.entries);
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries, key) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TranslationError> {
        let mut entries = lock(&self.entries);
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&entries, key) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, TranslationError> {
        Ok(lock(&self.entries).keys().cloned().collect())
    }
}

/// What: Replace `path` with `bytes` via a temporary sibling file.
///
/// # Errors
/// - Returns the underlying I/O error when any step fails
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
