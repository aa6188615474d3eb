//! `SessionGate`: page access decisions and authorized requests.
//!
//! ARCHITECTURE
//! ============
//! The gate owns its collaborators: a `SessionStore` with the cached session,
//! a `Navigator` for redirects and notices, and an `HttpTransport` for
//! outgoing requests. Page rendering is delegated to a `PageSurface` passed
//! per call.
//!
//! PAGE LOAD
//! =========
//! Evaluated once per load, never re-evaluated:
//!
//! | Page       | Session  | Result                              |
//! |------------|----------|-------------------------------------|
//! | public     | present  | redirect to the landing page        |
//! | public     | absent   | render unchanged                    |
//! | non-public | absent   | redirect to login                   |
//! | non-public | present  | render identity + role restriction  |
//!
//! A session cleared elsewhere (another tab) is noticed only on the next
//! navigation or failed request.
//!
//! TRADE-OFFS
//! ==========
//! Roles are a cached claim. Hiding controls is advisory UI; the server
//! stays the authorization boundary. A 403 is a permission problem and keeps
//! the session. A 401 means the credential is no longer accepted and ends it.

#[cfg(test)]
#[path = "gate_test.rs"]
mod gate_test;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::navigator::Navigator;
use crate::page::PageKind;
use crate::session::{self, SessionRecord};
use crate::store::SessionStore;
use crate::surface::{PageSurface, RestrictionPlan};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::view::{IdentityView, RoleBadge, ViewDecision};

pub const ACCESS_DENIED_NOTICE: &str = "Access Denied: You do not have permission to perform this action.";

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_FORBIDDEN: u16 = 403;

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of an authorized request that did not fail in transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "response", rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The server answered with something other than 401/403.
    Completed(ApiResponse),
    /// No credential was cached, or the server rejected it (401).
    RedirectedToLogin,
    /// The server refused the action (403); the user has been notified.
    Denied,
}

impl RequestOutcome {
    /// The response, or nothing if the gate handled the request itself.
    #[must_use]
    pub fn into_response(self) -> Option<ApiResponse> {
        match self {
            Self::Completed(response) => Some(response),
            Self::RedirectedToLogin | Self::Denied => None,
        }
    }

    #[must_use]
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Completed(response) => Some(response),
            Self::RedirectedToLogin | Self::Denied => None,
        }
    }
}

/// Page-load transition chosen by [`SessionGate::evaluate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageOutcome {
    /// Public page, no session: render as-is.
    Allow,
    /// Leave the page.
    Redirect { to: String },
    /// Protected page with a session.
    Render { identity: Option<IdentityView>, view: ViewDecision },
}

// =============================================================================
// GATE
// =============================================================================

pub struct SessionGate<S, N, T> {
    config: GateConfig,
    store: S,
    navigator: N,
    transport: T,
}

impl<S, N, T> SessionGate<S, N, T>
where
    S: SessionStore,
    N: Navigator,
{
    pub fn new(config: GateConfig, store: S, navigator: N, transport: T) -> Self {
        Self { config, store, navigator, transport }
    }

    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -------------------------------------------------------------------------
    // Session queries
    // -------------------------------------------------------------------------

    /// True iff a non-empty credential is cached. No expiry check.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some_and(|t| !t.is_empty())
    }

    /// The cached credential exactly as stored.
    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        self.store.get(&self.config.keys.credential)
    }

    #[must_use]
    pub fn current_session(&self) -> SessionRecord {
        SessionRecord::load(&self.store, &self.config.keys)
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().contains(role)
    }

    /// Whether the cached roles include the configured privileged role.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.has_role(&self.config.privileged_role)
    }

    fn roles(&self) -> BTreeSet<String> {
        session::load_roles(&self.store, &self.config.keys)
    }

    // -------------------------------------------------------------------------
    // Session teardown
    // -------------------------------------------------------------------------

    /// Clear all session fields and go to the login page. Safe without a session.
    pub fn logout(&self) {
        self.clear_session();
        tracing::info!(to = %self.config.login_path, "session cleared; redirecting to login");
        self.navigator.navigate(&self.config.login_path);
    }

    fn clear_session(&self) {
        self.store.clear(&self.config.keys.all());
    }

    // -------------------------------------------------------------------------
    // Page load
    // -------------------------------------------------------------------------

    /// Decide the page-load transition without performing it.
    #[must_use]
    pub fn evaluate(&self, page: &PageKind) -> PageOutcome {
        let authenticated = self.is_authenticated();
        match page {
            PageKind::Public if authenticated => PageOutcome::Redirect { to: self.config.landing_path.clone() },
            PageKind::Public => PageOutcome::Allow,
            _ if !authenticated => PageOutcome::Redirect { to: self.config.login_path.clone() },
            _ => PageOutcome::Render { identity: self.identity_view(), view: self.view_decision(page) },
        }
    }

    /// Gate entry point: evaluate once and carry out the transition.
    pub fn on_page_load<P: PageSurface + ?Sized>(&self, page: &PageKind, surface: &mut P) -> PageOutcome {
        let outcome = self.evaluate(page);
        match &outcome {
            PageOutcome::Allow => {
                tracing::debug!(?page, "public page rendered without session");
            }
            PageOutcome::Redirect { to } => {
                tracing::debug!(?page, %to, "page load redirected");
                self.navigator.navigate(to);
            }
            PageOutcome::Render { identity, view } => {
                if let Some(identity) = identity {
                    if surface.has_identity_slot() {
                        surface.fill_identity(identity);
                    }
                }
                let plan = RestrictionPlan::build(view, &*surface);
                tracing::debug!(?page, restricted = view.is_restricted(), hidden = plan.links.len(), "page rendered");
                plan.apply(surface);
            }
        }
        outcome
    }

    /// Identity-slot content, if a non-empty display name is cached.
    #[must_use]
    pub fn identity_view(&self) -> Option<IdentityView> {
        let display_name = self.store.get(&self.config.keys.display_name).filter(|n| !n.is_empty())?;
        let badge = if self.is_privileged() { RoleBadge::Privileged } else { RoleBadge::Standard };
        Some(IdentityView { badge, display_name, logout_path: self.config.login_path.clone() })
    }

    /// Fill the identity slot. No-op without a slot or a cached name.
    pub fn render_identity<P: PageSurface + ?Sized>(&self, surface: &mut P) {
        if !surface.has_identity_slot() {
            return;
        }
        if let Some(identity) = self.identity_view() {
            surface.fill_identity(&identity);
        }
    }

    /// What `page` should show to the current session.
    #[must_use]
    pub fn view_decision(&self, page: &PageKind) -> ViewDecision {
        match page.listing_resource() {
            Some(resource) if !self.is_privileged() => ViewDecision::view_only(resource),
            _ => ViewDecision::unrestricted(),
        }
    }

    /// Hide mutating controls on a view-only listing and add the banner once.
    ///
    /// Returns the plan that was applied; running it again is harmless.
    pub fn apply_role_restriction<P: PageSurface + ?Sized>(&self, page: &PageKind, surface: &mut P) -> RestrictionPlan {
        let decision = self.view_decision(page);
        let plan = RestrictionPlan::build(&decision, &*surface);
        plan.apply(surface);
        plan
    }
}

impl<S, N, T> SessionGate<S, N, T>
where
    S: SessionStore,
    N: Navigator,
    T: HttpTransport,
{
    /// Send `request` with the cached bearer credential.
    ///
    /// Without a credential nothing is sent: the user is sent to login and
    /// `RedirectedToLogin` is returned. A 401 clears the session and
    /// redirects the same way. A 403 shows [`ACCESS_DENIED_NOTICE`] and
    /// leaves the session alone.
    ///
    /// # Errors
    ///
    /// Returns the transport's `GateError` if no response was received.
    pub async fn authorized_request(&self, mut request: ApiRequest) -> Result<RequestOutcome, GateError> {
        let Some(token) = self.get_token().filter(|t| !t.is_empty()) else {
            tracing::debug!(url = %request.url, "no credential cached; redirecting to login");
            self.navigator.navigate(&self.config.login_path);
            return Ok(RequestOutcome::RedirectedToLogin);
        };

        request.set_header("Authorization", &format!("Bearer {token}"));
        request.set_header("Content-Type", "application/json");

        let url = request.url.clone();
        let method = request.method;
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(%url, %method, code = e.error_code(), error = %e, "authorized request failed");
                return Err(e);
            }
        };

        match response.status {
            STATUS_FORBIDDEN => {
                tracing::warn!(%url, %method, "request forbidden; session kept");
                self.navigator.notify(ACCESS_DENIED_NOTICE);
                Ok(RequestOutcome::Denied)
            }
            STATUS_UNAUTHORIZED => {
                tracing::info!(%url, %method, "credential rejected");
                self.logout();
                Ok(RequestOutcome::RedirectedToLogin)
            }
            status => {
                tracing::debug!(%url, %method, status, "authorized request completed");
                Ok(RequestOutcome::Completed(response))
            }
        }
    }
}
