//! Rendering adapter seam.
//!
//! ARCHITECTURE
//! ============
//! A `PageSurface` exposes an inventory of the rendered page (links, header
//! cells, last-column cells, identity slot, banner anchor) plus mutators. The
//! gate turns a `ViewDecision` into a `RestrictionPlan` over that inventory,
//! then applies the plan. Planning is pure, so it can be inspected or logged
//! before anything is hidden.
//!
//! `StaticPage` is the in-memory surface: server-rendered markup models build
//! one, and tests drive the gate through it.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use serde::Serialize;

use crate::view::{self, Banner, IdentityView, ViewDecision};

/// An anchor element as seen by the restriction rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// Where the advisory banner goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerAnchor {
    /// Directly after the page heading.
    AfterHeading,
    /// First child of the content container.
    ContainerStart,
}

/// Page markup as seen by the gate.
///
/// Indices passed to `hide_*` refer to positions in the vectors returned by
/// the matching inventory method.
pub trait PageSurface {
    fn has_identity_slot(&self) -> bool;
    fn fill_identity(&mut self, identity: &IdentityView);

    fn links(&self) -> Vec<Link>;
    fn hide_link(&mut self, index: usize);

    fn header_cells(&self) -> Vec<String>;
    fn hide_header_cell(&mut self, index: usize);

    /// Hrefs of the links inside each row's last cell.
    fn last_column_cells(&self) -> Vec<Vec<String>>;
    fn hide_last_column_cell(&mut self, index: usize);

    fn has_banner(&self, id: &str) -> bool;
    /// `None` when the page has no content container.
    fn banner_anchor(&self) -> Option<BannerAnchor>;
    fn insert_banner(&mut self, banner: &Banner, anchor: BannerAnchor);
}

// =============================================================================
// RESTRICTION PLAN
// =============================================================================

/// Concrete edits derived from a `ViewDecision` for one surface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RestrictionPlan {
    pub links: Vec<usize>,
    pub header_cells: Vec<usize>,
    pub last_column_cells: Vec<usize>,
    pub banner: Option<(Banner, BannerAnchor)>,
}

impl RestrictionPlan {
    /// Derive the edits needed on `surface`.
    ///
    /// An unrestricted decision yields an empty plan. The banner is planned
    /// only when the surface does not already carry one with the same id and
    /// has somewhere to put it.
    pub fn build<P: PageSurface + ?Sized>(decision: &ViewDecision, surface: &P) -> Self {
        let mut plan = Self::default();

        if !decision.visible_actions {
            plan.links = surface
                .links()
                .iter()
                .enumerate()
                .filter(|(_, link)| view::is_mutating_link(&link.href, &link.text))
                .map(|(i, _)| i)
                .collect();
            plan.header_cells = surface
                .header_cells()
                .iter()
                .enumerate()
                .filter(|(_, text)| view::is_actions_heading(text))
                .map(|(i, _)| i)
                .collect();
            plan.last_column_cells = surface
                .last_column_cells()
                .iter()
                .enumerate()
                .filter(|(_, hrefs)| view::is_actions_cell(hrefs.as_slice()))
                .map(|(i, _)| i)
                .collect();
        }

        if let Some(banner) = &decision.banner {
            if !surface.has_banner(&banner.id) {
                plan.banner = surface.banner_anchor().map(|anchor| (banner.clone(), anchor));
            }
        }

        plan
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
            && self.header_cells.is_empty()
            && self.last_column_cells.is_empty()
            && self.banner.is_none()
    }

    pub fn apply<P: PageSurface + ?Sized>(&self, surface: &mut P) {
        for &i in &self.links {
            surface.hide_link(i);
        }
        for &i in &self.header_cells {
            surface.hide_header_cell(i);
        }
        for &i in &self.last_column_cells {
            surface.hide_last_column_cell(i);
        }
        if let Some((banner, anchor)) = &self.banner {
            surface.insert_banner(banner, *anchor);
        }
    }
}

// =============================================================================
// STATIC PAGE
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StaticLink {
    pub href: String,
    pub text: String,
    pub hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StaticCell {
    pub text: String,
    pub hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StaticRowCell {
    pub hrefs: Vec<String>,
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlacedBanner {
    pub banner: Banner,
    pub anchor: BannerAnchor,
}

/// In-memory page model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StaticPage {
    pub identity_slot: bool,
    pub identity: Option<IdentityView>,
    pub container: bool,
    pub heading: bool,
    pub links: Vec<StaticLink>,
    pub header_cells: Vec<StaticCell>,
    pub last_column_cells: Vec<StaticRowCell>,
    pub banners: Vec<PlacedBanner>,
}

impl StaticPage {
    /// A page with an identity slot and a content container, nothing else.
    #[must_use]
    pub fn new() -> Self {
        Self { identity_slot: true, container: true, ..Self::default() }
    }

    #[must_use]
    pub fn with_heading(mut self) -> Self {
        self.heading = true;
        self
    }

    #[must_use]
    pub fn with_link(mut self, href: &str, text: &str) -> Self {
        self.links.push(StaticLink { href: href.to_owned(), text: text.to_owned(), hidden: false });
        self
    }

    #[must_use]
    pub fn with_header(mut self, text: &str) -> Self {
        self.header_cells.push(StaticCell { text: text.to_owned(), hidden: false });
        self
    }

    /// Add a table row whose last cell holds links to `hrefs`.
    #[must_use]
    pub fn with_row(mut self, hrefs: &[&str]) -> Self {
        self.last_column_cells.push(StaticRowCell {
            hrefs: hrefs.iter().map(|h| (*h).to_owned()).collect(),
            hidden: false,
        });
        self
    }

    /// Hrefs of links currently visible.
    #[must_use]
    pub fn visible_hrefs(&self) -> Vec<&str> {
        self.links
            .iter()
            .filter(|l| !l.hidden)
            .map(|l| l.href.as_str())
            .collect()
    }
}

impl PageSurface for StaticPage {
    fn has_identity_slot(&self) -> bool {
        self.identity_slot
    }

    fn fill_identity(&mut self, identity: &IdentityView) {
        self.identity = Some(identity.clone());
    }

    fn links(&self) -> Vec<Link> {
        self.links
            .iter()
            .map(|l| Link { href: l.href.clone(), text: l.text.clone() })
            .collect()
    }

    fn hide_link(&mut self, index: usize) {
        if let Some(link) = self.links.get_mut(index) {
            link.hidden = true;
        }
    }

    fn header_cells(&self) -> Vec<String> {
        self.header_cells.iter().map(|c| c.text.clone()).collect()
    }

    fn hide_header_cell(&mut self, index: usize) {
        if let Some(cell) = self.header_cells.get_mut(index) {
            cell.hidden = true;
        }
    }

    fn last_column_cells(&self) -> Vec<Vec<String>> {
        self.last_column_cells.iter().map(|c| c.hrefs.clone()).collect()
    }

    fn hide_last_column_cell(&mut self, index: usize) {
        if let Some(cell) = self.last_column_cells.get_mut(index) {
            cell.hidden = true;
        }
    }

    fn has_banner(&self, id: &str) -> bool {
        self.banners.iter().any(|b| b.banner.id == id)
    }

    fn banner_anchor(&self) -> Option<BannerAnchor> {
        if !self.container {
            return None;
        }
        Some(if self.heading { BannerAnchor::AfterHeading } else { BannerAnchor::ContainerStart })
    }

    fn insert_banner(&mut self, banner: &Banner, anchor: BannerAnchor) {
        self.banners.push(PlacedBanner { banner: banner.clone(), anchor });
    }
}
