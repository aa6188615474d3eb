//! Page identity supplied by the host application.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use serde::{Deserialize, Serialize};

use crate::config::GateConfig;

/// What kind of page is being loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageKind {
    /// Rendered without a session (login, registration).
    Public,
    /// Requires a session; no role-based restriction.
    Protected,
    /// Requires a session; view-only for non-privileged users.
    Listing { resource: String },
}

impl PageKind {
    /// Classify an exact request path against the configured page sets.
    ///
    /// For hosts that only know the current path. Query strings and trailing
    /// slashes are not normalized.
    #[must_use]
    pub fn classify(path: &str, config: &GateConfig) -> Self {
        if config.is_public(path) {
            return Self::Public;
        }
        match config.restricted_resource(path) {
            Some(resource) => Self::Listing { resource },
            None => Self::Protected,
        }
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }

    #[must_use]
    pub fn listing_resource(&self) -> Option<&str> {
        match self {
            Self::Listing { resource } => Some(resource),
            _ => None,
        }
    }
}
