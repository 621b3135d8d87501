//! File-based key-value backend.

use crate::error::{Error, Result};
use crate::kv::KeyValueStore;
use std::fs;
use std::path::PathBuf;

/// File-based key-value store with atomic writes, one file per key.
///
/// Plays the role of the device's durable local storage.
#[derive(Debug)]
pub struct FileKv {
    base_dir: PathBuf,
}

impl FileKv {
    /// Create a new file store.
    ///
    /// Creates the `kv` directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_dir.join("kv"))?;
        Ok(Self { base_dir })
    }

    /// Get the path backing a key.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::InvalidState(format!("invalid storage key: {key}")));
        }
        Ok(self.base_dir.join("kv").join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let temp = path.with_extension("tmp");

        fs::write(&temp, value)?;
        fs::rename(&temp, &path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
