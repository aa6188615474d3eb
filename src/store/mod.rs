//! Flat string key-value storage for the cached session.
//!
//! SYSTEM CONTEXT
//! ==============
//! The gate never touches browser storage directly. Hosts inject a
//! `SessionStore`: `LocalStorageStore` in the browser (hydrate), `MemoryStore`
//! for server rendering, the CLI, and tests.
//!
//! TRADE-OFFS
//! ==========
//! Writes are best-effort with no return value. A backend that refuses a write
//! (quota, private mode) degrades to "no session", which the gate already
//! handles by redirecting to login.


#[cfg(feature = "hydrate")]
mod local_storage;
#[cfg(feature = "hydrate")]
pub use local_storage::LocalStorageStore;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Key-value store holding the session fields under independent keys.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    /// Remove every key in `keys`. Missing keys are ignored.
    fn clear(&self, keys: &[&str]) {
        for key in keys {
            self.remove(key);
        }
    }
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

/// In-process store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `pairs`.
    #[must_use]
    pub fn with_entries<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Self { entries: Mutex::new(entries) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
