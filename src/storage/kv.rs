//! Key/Value Store Boundary
//!
//! The persistence boundary is an opaque blob store: values are strings
//! addressed by key. `Database` is the on-disk implementation;
//! `MemoryStore` serves embedding hosts and tests that need no disk.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::utils::error::{AppError, AppResult};

/// Get/set/delete-by-key blob storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove a key; removing an absent key is not an error
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Volatile in-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::internal("memory store lock poisoned")
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}
