//! Cached session record.
//!
//! The four fields live under independent storage keys and are read
//! best-effort: any subset may be present. Nothing here validates the
//! credential; the server decides that on the next authorized request.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::StorageKeys;
use crate::store::SessionStore;

/// Session fields as currently stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Opaque bearer token.
    pub credential: Option<String>,
    pub display_name: Option<String>,
    pub subject_id: Option<String>,
    pub roles: BTreeSet<String>,
}

impl SessionRecord {
    /// Read every field from `store`. Never fails.
    pub fn load<S: SessionStore + ?Sized>(store: &S, keys: &StorageKeys) -> Self {
        Self {
            credential: store.get(&keys.credential),
            display_name: store.get(&keys.display_name),
            subject_id: store.get(&keys.subject_id),
            roles: load_roles(store, keys),
        }
    }

    /// A credential is usable when present and non-empty.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential.as_deref().is_some_and(|c| !c.is_empty())
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Read and parse only the roles key.
pub fn load_roles<S: SessionStore + ?Sized>(store: &S, keys: &StorageKeys) -> BTreeSet<String> {
    store
        .get(&keys.roles)
        .map(|raw| parse_roles(&raw))
        .unwrap_or_default()
}

/// Parse a stored roles value (a JSON array of strings).
///
/// Anything else, including an array with a non-string member, yields the
/// empty set.
#[must_use]
pub fn parse_roles(raw: &str) -> BTreeSet<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(roles) => roles.into_iter().collect(),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed cached roles");
            BTreeSet::new()
        }
    }
}
