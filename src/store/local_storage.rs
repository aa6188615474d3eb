//! Browser `localStorage` backend.

use super::SessionStore;

/// `SessionStore` over `window.localStorage`.
///
/// Every call re-resolves the storage handle; when the browser refuses access
/// (no window, storage disabled) reads return `None` and writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl SessionStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        let Some(storage) = Self::storage() else {
            tracing::warn!(%key, "localStorage unavailable; write dropped");
            return;
        };
        if storage.set_item(key, value).is_err() {
            tracing::warn!(%key, "localStorage rejected write");
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}
