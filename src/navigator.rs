//! Navigation and blocking user notices.
//!
//! SYSTEM CONTEXT
//! ==============
//! Redirects are the gate's only abort mechanism: a missing or invalidated
//! session navigates away instead of raising an error. In the browser that is
//! a full page navigation; elsewhere the `RecordingNavigator` keeps the events
//! for the caller to act on.

#[cfg(test)]
#[path = "navigator_test.rs"]
mod navigator_test;

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

pub trait Navigator {
    /// Leave the current page for `path`.
    fn navigate(&self, path: &str);
    /// Show a blocking message to the user.
    fn notify(&self, message: &str);
}

impl<N: Navigator + ?Sized> Navigator for &N {
    fn navigate(&self, path: &str) {
        (**self).navigate(path);
    }

    fn notify(&self, message: &str) {
        (**self).notify(message);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NavEvent {
    Navigate(String),
    Notify(String),
}

/// Navigator that records events instead of acting on them.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavEvent>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Paths navigated to, in order.
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                NavEvent::Navigate(path) => Some(path),
                NavEvent::Notify(_) => None,
            })
            .collect()
    }

    /// Notices shown, in order.
    #[must_use]
    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                NavEvent::Notify(message) => Some(message),
                NavEvent::Navigate(_) => None,
            })
            .collect()
    }

    fn push(&self, event: NavEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.push(NavEvent::Navigate(path.to_owned()));
    }

    fn notify(&self, message: &str) {
        self.push(NavEvent::Notify(message.to_owned()));
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// Navigator over `window.location` and `window.alert`.
#[cfg(feature = "hydrate")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

#[cfg(feature = "hydrate")]
impl Navigator for BrowserNavigator {
    fn navigate(&self, path: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if window.location().set_href(path).is_err() {
            tracing::warn!(%path, "navigation rejected by browser");
        }
    }

    fn notify(&self, message: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if window.alert_with_message(message).is_err() {
            tracing::warn!(%message, "notice rejected by browser");
        }
    }
}
