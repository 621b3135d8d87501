//! In-memory key-value backend.

use crate::error::{Error, Result};
use crate::kv::KeyValueStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory key-value store with an optional byte quota.
///
/// Plays the role of per-tab session storage, and backs tests.
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKv {
    /// Create an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes pushing total key+value bytes past `quota_bytes`.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: RwLock::default(),
            quota_bytes: Some(quota_bytes),
        }
    }
}

fn poisoned() -> Error {
    Error::InvalidState("kv lock poisoned".to_string())
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        if let Some(quota) = self.quota_bytes {
            let used: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(Error::StorageQuotaExceeded(format!(
                    "writing {key} needs {} bytes, {} of {quota} in use",
                    key.len() + value.len(),
                    used
                )));
            }
        }
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.remove(key);
        Ok(())
    }
}
