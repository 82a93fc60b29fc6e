//! Values the engine hands to the host's surface primitives

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::callback::NotificationFn;

/// Parameters for registering a page as a menu surface.
///
/// Everything except `action` is plain data and round-trips through the
/// `"menuParams"` transform as a JSON object.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuParams {
    pub parent_slug: String,
    pub page_title: String,
    pub menu_title: String,
    pub capability: String,
    pub menu_slug: String,
    /// Render callback the host invokes when the surface is opened
    #[serde(skip)]
    pub action: Option<NotificationFn>,
    pub icon: String,
    pub position: Option<Number>,
    pub hide_menu: bool,
    /// Label of the first nested entry under a top-level surface
    pub menu_first_sub: String,
}

impl fmt::Debug for MenuParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuParams")
            .field("parent_slug", &self.parent_slug)
            .field("page_title", &self.page_title)
            .field("menu_title", &self.menu_title)
            .field("capability", &self.capability)
            .field("menu_slug", &self.menu_slug)
            .field("action", &self.action.as_ref().map(|_| ".."))
            .field("icon", &self.icon)
            .field("position", &self.position)
            .field("hide_menu", &self.hide_menu)
            .field("menu_first_sub", &self.menu_first_sub)
            .finish()
    }
}

/// A collapsible content box added to a post-like page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBox {
    pub id: String,
    pub title: String,
    /// Surface handle the box belongs to
    pub surface: String,
    /// Layout column: `normal`, `side` or `advanced`
    pub context: String,
}

/// A style or script the host should load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "handle", rename_all = "lowercase")]
pub enum Asset {
    Style(String),
    Script(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Warning,
}

/// Admin notice shown on a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub surface: String,
    pub kind: NoticeKind,
    pub message: String,
}
