//! In-memory relay backend.

use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::relay::clock::{Clock, SystemClock};
use crate::relay::traits::{RelayEntry, RelayStore};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Process-local relay store with one-shot TTL expiry.
///
/// Expired entries are unreadable as soon as the clock passes their expiry;
/// their memory is reclaimed by `purge_expired`, which runs on every
/// `create` and from the optional background sweeper.
pub struct MemoryRelay {
    entries: RwLock<HashMap<String, RelayEntry>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    max_entries: usize,
    max_payload_bytes: usize,
    consume_on_read: bool,
}

impl MemoryRelay {
    /// Create a relay using the wall clock.
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a relay with an injected clock.
    #[must_use]
    pub fn with_clock(config: &RelayConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = i64::try_from(config.ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            ttl,
            max_entries: config.max_entries,
            max_payload_bytes: config.max_payload_bytes,
            consume_on_read: config.consume_on_read,
        }
    }

    /// Number of stored entries, expired or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the store holds no entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn expiry_for(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, RelayEntry>>> {
        self.entries
            .read()
            .map_err(|_| Error::InvalidState("relay lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, RelayEntry>>> {
        self.entries
            .write()
            .map_err(|_| Error::InvalidState("relay lock poisoned".to_string()))
    }
}

fn purge(entries: &mut HashMap<String, RelayEntry>, now: DateTime<Utc>) -> usize {
    let before = entries.len();
    entries.retain(|session_id, entry| {
        let keep = !entry.is_expired(now);
        if !keep {
            debug!(%session_id, "relay entry expired");
        }
        keep
    });
    before - entries.len()
}

impl RelayStore for MemoryRelay {
    fn create(&self, payload: &str) -> Result<String> {
        if payload.trim().is_empty() {
            return Err(Error::InvalidPayload(
                "No image data or URL provided".to_string(),
            ));
        }
        if payload.len() > self.max_payload_bytes {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                limit: self.max_payload_bytes,
            });
        }

        let now = self.clock.now();
        let mut entries = self.write()?;
        purge(&mut entries, now);
        if entries.len() >= self.max_entries {
            warn!(entries = entries.len(), "relay store full");
            return Err(Error::Capacity(entries.len()));
        }

        let session_id = Uuid::new_v4().to_string();
        entries.insert(
            session_id.clone(),
            RelayEntry {
                payload: payload.to_string(),
                created_at: now,
                expires_at: self.expiry_for(now),
            },
        );
        info!(
            %session_id,
            len = payload.len(),
            kind = if crate::media::is_url(payload) { "url" } else { "data" },
            "stored relay payload"
        );
        Ok(session_id)
    }

    fn get(&self, session_id: &str) -> Result<String> {
        let now = self.clock.now();
        let not_found = || Error::NotFound(session_id.to_string());

        if self.consume_on_read {
            let mut entries = self.write()?;
            return match entries.remove(session_id) {
                Some(entry) if !entry.is_expired(now) => {
                    debug!(%session_id, "relay entry consumed");
                    Ok(entry.payload)
                }
                _ => Err(not_found()),
            };
        }

        let entries = self.read()?;
        match entries.get(session_id) {
            Some(entry) if !entry.is_expired(now) => Ok(entry.payload.clone()),
            _ => Err(not_found()),
        }
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        self.write()?.remove(session_id);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.write()?;
        Ok(purge(&mut entries, now))
    }
}

/// Periodically purge expired entries until the relay is dropped.
///
/// The thread holds only a weak reference, so dropping the last `Arc` to the
/// relay ends it after at most one `interval`.
pub fn spawn_sweeper(relay: &Arc<MemoryRelay>, interval: std::time::Duration) -> JoinHandle<()> {
    let weak: Weak<MemoryRelay> = Arc::downgrade(relay);
    thread::spawn(move || {
        loop {
            thread::sleep(interval);
            let Some(relay) = weak.upgrade() else {
                break;
            };
            match relay.purge_expired() {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "relay sweep"),
                Err(e) => warn!(error = %e, "relay sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::clock::ManualClock;
    use proptest::prelude::*;

    fn relay_with_clock(config: RelayConfig) -> (MemoryRelay, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let relay = MemoryRelay::with_clock(&config, clock.clone());
        (relay, clock)
    }

    #[test]
    fn create_then_get_returns_payload() {
        let (relay, _clock) = relay_with_clock(RelayConfig::default());
        let id = relay.create("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(relay.get(&id).unwrap(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn session_ids_are_uuids() {
        let (relay, _clock) = relay_with_clock(RelayConfig::default());
        let id = relay.create("https://example.com/a.jpg").unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let other = relay.create("https://example.com/a.jpg").unwrap();
        assert_ne!(id, other);
    }

    #[test]
    fn empty_payload_is_invalid() {
        let (relay, _clock) = relay_with_clock(RelayConfig::default());
        assert!(matches!(relay.create(""), Err(Error::InvalidPayload(_))));
        assert!(matches!(relay.create("   "), Err(Error::InvalidPayload(_))));
    }

    #[test]
    fn unknown_session_not_found() {
        let (relay, _clock) = relay_with_clock(RelayConfig::default());
        assert!(matches!(relay.get("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn entry_expires_after_ttl_even_if_never_read() {
        let (relay, clock) = relay_with_clock(RelayConfig::default());
        let id = relay.create("https://example.com/a.jpg").unwrap();

        clock.advance(Duration::seconds(299));
        assert!(relay.get(&id).is_ok());

        clock.advance(Duration::seconds(1));
        assert!(matches!(relay.get(&id), Err(Error::NotFound(_))));
    }

    #[test]
    fn reads_do_not_renew_ttl() {
        let (relay, clock) = relay_with_clock(RelayConfig::default());
        let id = relay.create("https://example.com/a.jpg").unwrap();

        for _ in 0..4 {
            clock.advance(Duration::seconds(60));
            assert!(relay.get(&id).is_ok());
        }
        clock.advance(Duration::seconds(60));
        assert!(relay.get(&id).is_err());
    }

    #[test]
    fn repeated_reads_observe_same_payload() {
        let (relay, _clock) = relay_with_clock(RelayConfig::default());
        let id = relay.create("https://example.com/a.jpg").unwrap();
        for _ in 0..3 {
            assert_eq!(relay.get(&id).unwrap(), "https://example.com/a.jpg");
        }
    }

    #[test]
    fn consume_on_read_deletes_after_first_get() {
        let config = RelayConfig {
            consume_on_read: true,
            ..RelayConfig::default()
        };
        let (relay, _clock) = relay_with_clock(config);
        let id = relay.create("https://example.com/a.jpg").unwrap();

        assert!(relay.get(&id).is_ok());
        assert!(matches!(relay.get(&id), Err(Error::NotFound(_))));
        assert!(relay.is_empty().unwrap());
    }

    #[test]
    fn purge_removes_only_expired() {
        let (relay, clock) = relay_with_clock(RelayConfig::default());
        relay.create("https://example.com/old.jpg").unwrap();
        clock.advance(Duration::seconds(200));
        let fresh = relay.create("https://example.com/new.jpg").unwrap();
        clock.advance(Duration::seconds(150));

        assert_eq!(relay.purge_expired().unwrap(), 1);
        assert_eq!(relay.len().unwrap(), 1);
        assert!(relay.get(&fresh).is_ok());
    }

    #[test]
    fn capacity_guard_rejects_when_full() {
        let config = RelayConfig {
            max_entries: 2,
            ..RelayConfig::default()
        };
        let (relay, clock) = relay_with_clock(config);
        relay.create("https://example.com/1.jpg").unwrap();
        relay.create("https://example.com/2.jpg").unwrap();
        assert!(matches!(
            relay.create("https://example.com/3.jpg"),
            Err(Error::Capacity(2))
        ));

        // Expired entries free their slots on the next create
        clock.advance(Duration::seconds(301));
        assert!(relay.create("https://example.com/3.jpg").is_ok());
        assert_eq!(relay.len().unwrap(), 1);
    }

    #[test]
    fn oversized_payload_rejected() {
        let config = RelayConfig {
            max_payload_bytes: 16,
            ..RelayConfig::default()
        };
        let (relay, _clock) = relay_with_clock(config);
        let result = relay.create("https://example.com/very/long/path.jpg");
        assert!(matches!(
            result,
            Err(Error::PayloadTooLarge { limit: 16, .. })
        ));
    }

    #[test]
    fn delete_removes_entry() {
        let (relay, _clock) = relay_with_clock(RelayConfig::default());
        let id = relay.create("https://example.com/a.jpg").unwrap();
        relay.delete(&id).unwrap();
        assert!(relay.get(&id).is_err());
        relay.delete("nonexistent").unwrap();
    }

    #[test]
    fn huge_ttl_does_not_overflow() {
        let config = RelayConfig {
            ttl_seconds: u64::MAX,
            ..RelayConfig::default()
        };
        let (relay, clock) = relay_with_clock(config);
        let id = relay.create("https://example.com/a.jpg").unwrap();
        clock.advance(Duration::days(365));
        assert!(relay.get(&id).is_ok());
    }

    #[test]
    fn concurrent_creates_and_reads() {
        use std::thread;

        let relay = Arc::new(MemoryRelay::new(&RelayConfig::default()));
        let mut handles = vec![];
        for i in 0..8 {
            let relay = Arc::clone(&relay);
            handles.push(thread::spawn(move || {
                for j in 0..10 {
                    let payload = format!("https://example.com/{i}/{j}.jpg");
                    let id = relay.create(&payload).unwrap();
                    assert_eq!(relay.get(&id).unwrap(), payload);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("Thread panicked");
        }
        assert_eq!(relay.len().unwrap(), 80);
    }

    #[test]
    fn sweeper_stops_when_relay_dropped() {
        let relay = Arc::new(MemoryRelay::new(&RelayConfig::default()));
        let handle = spawn_sweeper(&relay, std::time::Duration::from_millis(5));
        drop(relay);
        handle.join().expect("sweeper panicked");
    }

    proptest! {
        #[test]
        fn get_after_create_roundtrips(payload in "[A-Za-z0-9+/=:;,.]{1,256}") {
            prop_assume!(!payload.trim().is_empty());
            let relay = MemoryRelay::new(&RelayConfig::default());
            let id = relay.create(&payload).unwrap();
            prop_assert_eq!(relay.get(&id).unwrap(), payload);
        }
    }
}
