//! Memory store trait and the default in-process implementation.

use crate::error::MemoryError;
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Key-value memory shared by skills and reasoners.
///
/// Writes are last-write-wins; a `get` after `set` on the same key observes
/// the written value.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Fetch a value, `None` when the key was never set or was deleted.
    async fn get(&self, key: &str) -> Result<Option<Value>, MemoryError>;

    /// Store a value, replacing any prior value.
    async fn set(&self, key: &str, value: Value) -> Result<(), MemoryError>;

    /// Remove a key, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, MemoryError>;

    /// List keys, optionally restricted to a prefix. Sorted ascending.
    async fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>, MemoryError>;
}

/// Read a key and decode it into `T`.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn MemoryStore,
    key: &str,
) -> Result<Option<T>, MemoryError> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode `value` and store it under `key`.
pub async fn set_json<T: Serialize + Sync>(
    store: &dyn MemoryStore,
    key: &str,
    value: &T,
) -> Result<(), MemoryError> {
    let value = serde_json::to_value(value)?;
    store.set(key, value).await
}

pub(crate) fn check_key(key: &str) -> Result<(), MemoryError> {
    if key.trim().is_empty() {
        return Err(MemoryError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub(crate) fn filter_keys<'a>(
    keys: impl Iterator<Item = &'a String>,
    prefix: Option<&str>,
) -> Vec<String> {
    keys.filter(|key| prefix.is_none_or(|prefix| key.starts_with(prefix)))
        .cloned()
        .collect()
}

/// In-process store backed by an ordered map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, MemoryError> {
        check_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), MemoryError> {
        check_key(key)?;
        self.entries.write().insert(key.to_string(), value);
        debug!("memory set (key={key})");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, MemoryError> {
        check_key(key)?;
        let removed = self.entries.write().remove(key).is_some();
        debug!("memory delete (key={key}, removed={removed})");
        Ok(removed)
    }

    async fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>, MemoryError> {
        let entries = self.entries.read();
        Ok(filter_keys(entries.keys(), prefix))
    }
}
