//! Durable key-value persistence adapter.
//!
//! # Contract
//!
//! - `load` never fails: an absent key and a corrupt value both come back as
//!   `None`. A corrupt value is removed so the next read does not re-parse it.
//! - `save` never fails either: a rejected write (quota, I/O) is logged and
//!   reported through the `bool` return only. In-memory state stays
//!   authoritative for the running session.
//! - There is no transaction across keys; the last writer wins.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - in-process map with an optional byte quota
//! - [`FileStorage`] - one file per key under a data directory

mod storage;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};

/// Persistence keys used by the state layer.
pub mod keys {
    /// JSON array of cart items.
    pub const CART: &str = "cart";

    /// Plain-string name of the active dashboard section.
    pub const CURRENT_DASHBOARD_SECTION: &str = "currentDashboardSection";

    /// Plain-string ID of the selected dashboard sub-entity.
    pub const SELECTED_ENTITY_ID: &str = "selectedEntityId";

    /// Plain-string ID of the selected user.
    pub const SELECTED_USER_ID: &str = "selectedUserId";
}

/// JSON-serializing adapter over a [`KeyValueStorage`].
///
/// Cheaply cloneable; clones share the same backend.
#[derive(Clone)]
pub struct Persistence {
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}

impl Persistence {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Persistence over a fresh unbounded [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Load and deserialize the JSON value at `key`.
    ///
    /// Returns `None` if the key is absent, unreadable, or does not parse as
    /// `T`. Unparseable entries are removed.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.load_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupt persisted value");
                self.remove(key);
                None
            }
        }
    }

    /// Serialize `value` as JSON and write it at `key`.
    ///
    /// Returns whether the write landed. Failures are logged, never raised.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.save_raw(key, &raw),
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize value for persistence");
                false
            }
        }
    }

    /// Read the raw string at `key`.
    pub fn load_raw(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read persisted value");
                None
            }
        }
    }

    /// Write a raw string at `key`. Returns whether the write landed.
    pub fn save_raw(&self, key: &str, value: &str) -> bool {
        match self.storage.set(key, value) {
            Ok(()) => {
                debug!(key, bytes = value.len(), "Persisted value");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to persist value, keeping in-memory state");
                false
            }
        }
    }

    /// Remove `key`. Returns whether the removal succeeded.
    pub fn remove(&self, key: &str) -> bool {
        match self.storage.remove(key) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "Failed to remove persisted value");
                false
            }
        }
    }

    /// Write `Some(value)` as a raw string, or remove the key for `None`.
    pub fn save_optional_raw(&self, key: &str, value: Option<&str>) -> bool {
        value.map_or_else(|| self.remove(key), |value| self.save_raw(key, value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_load_absent_is_none() {
        let persistence = Persistence::in_memory();
        assert!(persistence.load::<Vec<String>>("cart").is_none());
    }

    #[test]
    fn test_save_then_load() {
        let persistence = Persistence::in_memory();
        assert!(persistence.save("cart", &vec!["a", "b"]));
        assert_eq!(
            persistence.load::<Vec<String>>("cart"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_corrupt_value_is_discarded_and_cleared() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("cart", "{not json").unwrap();
        let persistence = Persistence::new(storage.clone());

        assert!(persistence.load::<Vec<String>>("cart").is_none());
        assert!(storage.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_wrong_shape_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("cart", r#"{"id":"p1"}"#).unwrap();
        let persistence = Persistence::new(storage.clone());

        assert!(persistence.load::<Vec<String>>("cart").is_none());
        assert!(storage.get("cart").unwrap().is_none());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let persistence = Persistence::new(Arc::new(MemoryStorage::with_quota(4)));
        assert!(!persistence.save("cart", &vec!["far too long for the quota"]));
        assert!(persistence.load::<Vec<String>>("cart").is_none());
    }

    #[test]
    fn test_save_optional_raw_removes_on_none() {
        let persistence = Persistence::in_memory();
        assert!(persistence.save_optional_raw(keys::SELECTED_USER_ID, Some("u-1")));
        assert_eq!(
            persistence.load_raw(keys::SELECTED_USER_ID).as_deref(),
            Some("u-1")
        );

        assert!(persistence.save_optional_raw(keys::SELECTED_USER_ID, None));
        assert!(persistence.load_raw(keys::SELECTED_USER_ID).is_none());
    }
}
