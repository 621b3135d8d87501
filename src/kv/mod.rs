//! Key-value storage standing in for the browser's session and local storage.

pub mod file;
pub mod memory;

pub use file::FileKv;
pub use memory::MemoryKv;

use crate::error::Result;

/// Durable key used for the cross-session image fallback.
pub const UPLOADED_IMAGE_KEY: &str = "uploadedImage";

/// Volatile key used for the same-tab image cache.
pub const CURRENT_IMAGE_KEY: &str = "currentImage";

/// String-keyed string storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageQuotaExceeded` when the store is out of space, or a
    /// storage error.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn remove(&self, key: &str) -> Result<()>;
}
