//! File-backed memory store persisting all entries in one JSON document.

use crate::error::MemoryError;
use crate::store::{MemoryStore, check_key, filter_keys};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Store that keeps a cached copy in memory and rewrites the file on change.
#[derive(Debug)]
pub struct FileMemoryStore {
    /// Path to the JSON document.
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl FileMemoryStore {
    /// Open or create a store at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let entries = load_entries(&path)?;
        info!(
            "initialized file memory store (path={}, keys={})",
            path.display(),
            entries.len()
        );
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Rewrite the backing file atomically.
    fn persist(&self, entries: &Map<String, Value>) -> Result<(), MemoryError> {
        let temp_path = self.temp_path();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            let body = serde_json::to_string_pretty(entries)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(temp_path, &self.path)?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<Map<String, Value>, MemoryError> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => Ok(map),
        other => Err(MemoryError::Corrupt {
            path: path.display().to_string(),
            reason: format!("expected object, found {}", type_name(&other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl MemoryStore for FileMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, MemoryError> {
        check_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), MemoryError> {
        check_key(key)?;
        let mut entries = self.entries.write();
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value);
        self.persist(&updated)?;
        *entries = updated;
        debug!("memory set (key={key}, path={})", self.path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, MemoryError> {
        check_key(key)?;
        let mut entries = self.entries.write();
        let mut updated = entries.clone();
        let removed = updated.remove(key).is_some();
        if removed {
            self.persist(&updated)?;
            *entries = updated;
        }
        debug!("memory delete (key={key}, removed={removed})");
        Ok(removed)
    }

    async fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>, MemoryError> {
        let entries = self.entries.read();
        let mut keys = filter_keys(entries.keys(), prefix);
        keys.sort();
        Ok(keys)
    }
}
