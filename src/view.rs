//! Declarative view decisions.
//!
//! DESIGN
//! ======
//! The gate never edits markup itself. It computes what the page should show
//! (`ViewDecision`, `IdentityView`) and a rendering adapter applies it (see
//! `surface`). The link and column rules below decide which controls count as
//! mutating.
//!
//! The view-only restriction is advisory: hidden controls keep working if
//! invoked directly, so the server must still enforce permissions.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use serde::Serialize;

/// DOM id of the advisory banner; used to keep it unique per page.
pub const BANNER_ID: &str = "admin-only-alert";
pub const BANNER_TITLE: &str = "View-Only Mode";

const EDIT_MARKER: &str = "/edit";
const DELETE_MARKER: &str = "/delete";
const CREATE_MARKERS: [&str; 2] = ["/form", "/new"];
const CREATE_LABELS: [&str; 2] = ["Add", "New"];
const ACTIONS_HEADING: &str = "actions";

// =============================================================================
// VIEW DECISION
// =============================================================================

/// What a protected page should show for the current session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewDecision {
    /// Whether create/edit/delete affordances stay visible.
    pub visible_actions: bool,
    /// Advisory banner to insert, if any.
    pub banner: Option<Banner>,
}

impl ViewDecision {
    /// Everything visible, no banner.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self { visible_actions: true, banner: None }
    }

    /// Mutating controls hidden, with a banner naming `resource`.
    #[must_use]
    pub fn view_only(resource: &str) -> Self {
        Self { visible_actions: false, banner: Some(Banner::view_only(resource)) }
    }

    #[must_use]
    pub fn is_restricted(&self) -> bool {
        !self.visible_actions
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub message: String,
}

impl Banner {
    #[must_use]
    pub fn view_only(resource: &str) -> Self {
        Self {
            id: BANNER_ID.to_owned(),
            title: BANNER_TITLE.to_owned(),
            message: format!("You can view {resource}, but only administrators can add, edit, or delete them."),
        }
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleBadge {
    Privileged,
    Standard,
}

impl RoleBadge {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Privileged => "👑 ADMIN",
            Self::Standard => "👤 USER",
        }
    }
}

/// Content for the identity slot: role badge, name, and a logout control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IdentityView {
    pub badge: RoleBadge,
    pub display_name: String,
    /// Where the logout control sends the user.
    pub logout_path: String,
}

impl IdentityView {
    #[must_use]
    pub fn greeting(&self) -> String {
        format!("Welcome, {}", self.display_name)
    }
}

// =============================================================================
// MUTATING-CONTROL RULES
// =============================================================================

/// Whether an href points at an edit or delete action.
#[must_use]
pub fn is_edit_or_delete_href(href: &str) -> bool {
    href.contains(EDIT_MARKER) || href.contains(DELETE_MARKER)
}

/// Whether a link is a mutating control that a view-only page must hide.
///
/// Edit and delete links always qualify. Links to a create form qualify only
/// when their label contains `Add` or `New`.
#[must_use]
pub fn is_mutating_link(href: &str, text: &str) -> bool {
    if is_edit_or_delete_href(href) {
        return true;
    }
    CREATE_MARKERS.iter().any(|m| href.contains(m)) && CREATE_LABELS.iter().any(|l| text.contains(l))
}

/// Whether a table header labels the actions column.
#[must_use]
pub fn is_actions_heading(text: &str) -> bool {
    text.trim().to_lowercase() == ACTIONS_HEADING
}

/// Whether a last-column cell holds row actions, judged by its links.
#[must_use]
pub fn is_actions_cell<S: AsRef<str>>(hrefs: &[S]) -> bool {
    hrefs.iter().any(|h| is_edit_or_delete_href(h.as_ref()))
}
