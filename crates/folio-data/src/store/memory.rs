//! In-memory result store.

use super::{DataId, Payload, ResultStore};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Lifecycle policy for a [`MemoryStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Entries older than this are treated as absent. `None` keeps entries
    /// until the store is dropped.
    pub max_age: Option<Duration>,
}

/// A stored payload together with its write time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Key the payload is stored under.
    pub key: DataId,
    /// The payload.
    pub payload: Payload,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, max_age: Option<Duration>, now: DateTime<Utc>) -> bool {
        max_age.is_some_and(|age| now - self.stored_at > age)
    }
}

/// Result store backed by a `HashMap` behind a read/write lock.
///
/// Writers are serialized by the lock. Readers receive a [`Payload`] whose
/// contents are shared and immutable, so a concurrent overwrite replaces the
/// entry without touching data a reader already holds.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<DataId, CacheEntry>>,
    config: StoreConfig,
}

impl MemoryStore {
    /// Create an empty store that keeps entries for its whole lifetime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a lifecycle policy.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            entries: RwLock::default(),
            config,
        }
    }

    /// The store's lifecycle policy.
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Full entry for `key`, including its write time.
    pub fn entry(&self, key: &DataId) -> Option<CacheEntry> {
        self.entry_at(key, Utc::now())
    }

    /// Remove expired entries and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn entry_at(&self, key: &DataId, now: DateTime<Utc>) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(self.config.max_age, now))
            .cloned()
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        if self.config.max_age.is_none() {
            return 0;
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.config.max_age, now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "purged expired store entries");
        }
        removed
    }
}

impl ResultStore for MemoryStore {
    fn put_at(&self, key: DataId, payload: Payload) -> DataId {
        let kind = payload.kind();
        let entry = CacheEntry {
            key: key.clone(),
            payload,
            stored_at: Utc::now(),
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = entries.insert(key.clone(), entry).is_some();
        debug!(data_id = %key, %kind, replaced, "stored payload");
        key
    }

    fn get(&self, key: &DataId) -> Option<Payload> {
        let payload = self.entry(key).map(|entry| entry.payload);
        debug!(data_id = %key, hit = payload.is_some(), "store lookup");
        payload
    }

    fn len(&self) -> usize {
        let now = Utc::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .filter(|entry| !entry.is_expired(self.config.max_age, now))
            .count()
    }
}
