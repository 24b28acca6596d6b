use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read settings store '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write settings store '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings store '{path}' is not a JSON string map: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Flat string-keyed settings store.
///
/// Setting `None` deletes the key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), StoreError>;
}

/// In-process store; contents die with the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        match value {
            Some(v) => {
                self.entries.insert(key.to_string(), v.to_string());
            }
            None => {
                self.entries.remove(key);
            }
        }
        Ok(())
    }
}

/// Store backed by a JSON object on disk.
///
/// Every `set` rewrites the file, so each call is durable on return; a failed
/// write leaves the store as it was. A multi-key update is not atomic as a
/// whole.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let display = path.display().to_string();
        let entries = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Json {
                path: display,
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: display,
                    source,
                });
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let display = self.path.display().to_string();
        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Json {
            path: display.clone(),
            source,
        })?;

        std::fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: display,
            source,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    /// The in-memory map only changes once the file was written.
    fn set(&mut self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        match value {
            Some(v) => {
                next.insert(key.to_string(), v.to_string());
            }
            None => {
                next.remove(key);
            }
        }
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }
}
