//! Process-local result store.
//!
//! Analysis stages publish their results here and hand back a [`DataId`];
//! later stages fetch by that id instead of receiving the data directly. A
//! store is an explicit object: create one, share it behind an [`Arc`] with
//! every stage that needs it, drop it when the process is done.
//!
//! [`Arc`]: std::sync::Arc

pub mod id;
pub mod memory;
pub mod payload;

pub use id::DataId;
pub use memory::{CacheEntry, MemoryStore, StoreConfig};
pub use payload::{Payload, PayloadKind, ReturnsTable, ScalarSeries, WeightMapping};

use crate::error::{DataError, Result};
use std::fmt::Debug;
use std::sync::Arc;

/// Key/value store for analysis results.
///
/// A lookup for an unknown key is a normal outcome and yields `None`.
pub trait ResultStore: Debug + Send + Sync {
    /// Store `payload` under a freshly generated key and return that key.
    fn put(&self, payload: Payload) -> DataId {
        self.put_at(DataId::generate(), payload)
    }

    /// Store `payload` under `key`, replacing any existing entry.
    fn put_at(&self, key: DataId, payload: Payload) -> DataId;

    /// Fetch the payload stored under `key`.
    fn get(&self, key: &DataId) -> Option<Payload>;

    /// Whether `key` currently resolves to a payload.
    fn contains(&self, key: &DataId) -> bool {
        self.get(key).is_some()
    }

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Whether the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Kind-checked lookups on top of [`ResultStore`].
///
/// An absent key is `Ok(None)`; a key holding a different payload kind is a
/// [`DataError::PayloadKind`] error.
pub trait StoreExt: ResultStore {
    /// Fetch a returns table.
    fn get_table(&self, key: &DataId) -> Result<Option<Arc<ReturnsTable>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Payload::Table(table)) => Ok(Some(table)),
            Some(other) => Err(kind_error(key, PayloadKind::Table, &other)),
        }
    }

    /// Fetch a weight mapping.
    fn get_weights(&self, key: &DataId) -> Result<Option<Arc<WeightMapping>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Payload::Weights(weights)) => Ok(Some(weights)),
            Some(other) => Err(kind_error(key, PayloadKind::Weights, &other)),
        }
    }

    /// Fetch a scalar series.
    fn get_series(&self, key: &DataId) -> Result<Option<Arc<ScalarSeries>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Payload::Series(series)) => Ok(Some(series)),
            Some(other) => Err(kind_error(key, PayloadKind::Series, &other)),
        }
    }
}

impl<T: ResultStore + ?Sized> StoreExt for T {}

fn kind_error(key: &DataId, expected: PayloadKind, found: &Payload) -> DataError {
    DataError::PayloadKind {
        id: key.clone(),
        expected,
        found: found.kind(),
    }
}
