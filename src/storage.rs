//! Flat key-value persistence.
//!
//! Every persisted front-end value (switch states, hotbutton configs, theme,
//! settings form values) lives under a fixed string key. Stores implement
//! [`KvStore`]; components talk to the shared [`Storage`] handle, which
//! swallows read/write failures and treats them as absent state.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// A flat string key-value store.
pub trait KvStore: Send {
    /// Reads the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Lists all stored keys in sorted order.
    fn keys(&self) -> Vec<String>;
}

/// Volatile store used by tests and by hosts that do not persist.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Store backed by a single JSON object file (`{"key": "raw value"}`).
///
/// The whole map is rewritten on every mutation using a temp file + rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file yields an empty store. A file that cannot be parsed is
    /// ignored (and will be overwritten by the next write).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .context(format!("Failed to read store file: {}", path.display()))?;
            match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring unreadable store {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context(format!(
                    "Failed to create store directory: {}",
                    parent.display()
                ))?;
            }
        }

        let content =
            serde_json::to_string_pretty(&self.entries).context("Failed to serialize store")?;
        let temp_path = self.path.with_extension("json.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp store file: {}",
            temp_path.display()
        ))?;
        fs::rename(&temp_path, &self.path).context(format!(
            "Failed to rename temp store file to: {}",
            self.path.display()
        ))?;

        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Shared, cloneable handle to the active store.
///
/// All accessors are infallible: failures are logged and reported as absent
/// values so that callers fall back to their defaults.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Mutex<Box<dyn KvStore>>>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Wraps a concrete store.
    pub fn new(store: impl KvStore + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(store))),
        }
    }

    /// Creates a handle over a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn with_store<R>(&self, f: impl FnOnce(&mut dyn KvStore) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_mut())
    }

    /// Reads a raw value, treating errors as absence.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.with_store(|store| match store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("storage read of {key} failed: {e:#}");
                None
            }
        })
    }

    /// Writes a raw value; failures are logged and dropped.
    pub fn set_raw(&self, key: &str, value: &str) {
        self.with_store(|store| {
            if let Err(e) = store.set(key, value) {
                tracing::warn!("storage write of {key} failed: {e:#}");
            }
        });
    }

    /// Removes a key; failures are logged and dropped.
    pub fn remove(&self, key: &str) {
        self.with_store(|store| {
            if let Err(e) = store.remove(key) {
                tracing::warn!("storage removal of {key} failed: {e:#}");
            }
        });
    }

    /// Returns true when a value exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }

    /// Reads and decodes a JSON value. Missing or malformed values are `None`.
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("ignoring malformed JSON under {key}: {e}");
                None
            }
        }
    }

    /// Encodes and writes a JSON value.
    pub fn write_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, &raw),
            Err(e) => tracing::warn!("failed to encode value for {key}: {e}"),
        }
    }

    /// Lists stored keys.
    pub fn keys(&self) -> Vec<String> {
        self.with_store(|store| store.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let storage = Storage::in_memory();
        assert!(!storage.contains("theme"));

        storage.set_raw("theme", "dark");
        assert_eq!(storage.get_raw("theme").as_deref(), Some("dark"));

        storage.remove("theme");
        assert_eq!(storage.get_raw("theme"), None);
    }

    #[test]
    fn test_read_json_malformed_is_none() {
        let storage = Storage::in_memory();
        storage.set_raw("st:switches:v1", "{not json");
        let value: Option<serde_json::Value> = storage.read_json("st:switches:v1");
        assert!(value.is_none());
    }

    #[test]
    fn test_write_json_then_read() {
        let storage = Storage::in_memory();
        storage.write_json("settings:extra:v1", &json!({"extra-toggle-1": true}));
        let value: serde_json::Value = storage.read_json("settings:extra:v1").unwrap();
        assert_eq!(value["extra-toggle-1"], json!(true));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        {
            let mut store = FileStore::open(&path).unwrap();
            store.set("hotbutton:inbox", "{}").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.get("hotbutton:inbox").unwrap().as_deref(),
            Some("{}")
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "garbage").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.keys().is_empty());
    }
}
