use std::collections::HashMap;
use std::sync::RwLock;

use super::r#trait::{DurableStore, StoreError};

/// In-memory key-value store.
///
/// Intended for tests/dev. Contents are lost with the process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, e.g. a snapshot left behind by an earlier process.
    pub fn with_entry(key: impl Into<String>, blob: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.write() {
            entries.insert(key.into(), blob.into());
        }
        store
    }

    /// Current value under `key`, bypassing the async interface.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }
}

#[async_trait::async_trait]
impl DurableStore for InMemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Read("lock poisoned".to_string()))?;

        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Write("lock poisoned".to_string()))?;

        entries.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
