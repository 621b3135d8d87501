//! Relay store trait definitions.

use crate::error::Result;
use chrono::{DateTime, Utc};

/// Storage backend for relayed image payloads.
///
/// Implementations own their entries exclusively; callers only see payload
/// strings. A single-process map is the default, but anything honouring the
/// same expiry contract (a networked cache, say) can stand in.
pub trait RelayStore: Send + Sync {
    /// Store a payload and return a fresh session identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for an empty payload, `PayloadTooLarge` or
    /// `Capacity` when limits are hit, or a storage error.
    fn create(&self, payload: &str) -> Result<String>;

    /// Look up a live payload.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for expired or unknown sessions.
    fn get(&self, session_id: &str) -> Result<String>;

    /// Remove a session. Removing an unknown session succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete(&self, session_id: &str) -> Result<()>;

    /// Drop every expired entry, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn purge_expired(&self) -> Result<usize>;
}

/// A stored payload with its fixed expiry.
#[derive(Debug, Clone)]
pub struct RelayEntry {
    /// Data URL or plain URL.
    pub payload: String,

    /// When the entry was stored.
    pub created_at: DateTime<Utc>,

    /// When the entry stops being readable.
    pub expires_at: DateTime<Utc>,
}

impl RelayEntry {
    /// Whether the entry is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
