//! # Session Store
//!
//! Thread-safe, in-memory session storage. Keys are namespaced with a fixed
//! prefix; values are JSON. Nothing is persisted across process restarts.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const SESSION_PREFIX: &str = "lantern";

/// In-memory session store
///
/// `insert` refuses to overwrite an existing key; use `remove` first to
/// replace a value. Cloning shares the underlying storage.
#[derive(Clone, Default)]
pub struct SessionStore {
    data: Arc<RwLock<HashMap<String, Value>>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning false when the key already exists
    pub fn insert(&self, key: &str, value: Value) -> bool {
        let mut data = self.data.write().expect("Session lock poisoned");
        let key = prefixed(key);
        if data.contains_key(&key) {
            return false;
        }
        data.insert(key, value);
        true
    }

    /// Get a cloned value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let data = self.data.read().expect("Session lock poisoned");
        data.get(&prefixed(key)).cloned()
    }

    /// Check if a key exists
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let data = self.data.read().expect("Session lock poisoned");
        data.contains_key(&prefixed(key))
    }

    /// Remove a value, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        let mut data = self.data.write().expect("Session lock poisoned");
        data.remove(&prefixed(key)).is_some()
    }

    /// Drop all stored sessions
    pub fn clear(&self) {
        let mut data = self.data.write().expect("Session lock poisoned");
        data.clear();
    }

    /// Number of stored values
    #[must_use]
    pub fn len(&self) -> usize {
        let data = self.data.read().expect("Session lock poisoned");
        data.len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read().expect("Session lock poisoned");
        f.debug_struct("SessionStore")
            .field("keys", &data.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn prefixed(key: &str) -> String {
    format!("{SESSION_PREFIX}[{key}]")
}
