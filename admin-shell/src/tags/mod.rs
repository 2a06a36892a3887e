//! Visited-page tabs.

use parking_lot::RwLock;
use route_tree::ResolvedRoute;
use serde::Serialize;

use crate::session::SessionReset;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub path: String,
    pub title: String,
    pub icon: Option<String>,
    /// Pinned: never closed by the user.
    pub affix: bool,
}

impl Tag {
    pub fn from_route(route: &ResolvedRoute) -> Self {
        let title = if route.meta.title.is_empty() {
            route.name.clone().unwrap_or_else(|| route.full_path.clone())
        } else {
            route.meta.title.clone()
        };
        Self {
            path: route.full_path.clone(),
            title,
            icon: route.meta.icon.clone(),
            affix: route.meta.affix,
        }
    }
}

#[derive(Debug, Default)]
struct Tabs {
    tags: Vec<Tag>,
    active: Option<String>,
}

/// Tabs of the pages visited during the session, in visit order.
#[derive(Debug, Default)]
pub struct TagHistory {
    inner: RwLock<Tabs>,
}

impl TagHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit. Revisiting a path only makes it active.
    pub fn visit(&self, tag: Tag) {
        let mut tabs = self.inner.write();
        tabs.active = Some(tag.path.clone());
        if !tabs.tags.iter().any(|t| t.path == tag.path) {
            tabs.tags.push(tag);
        }
    }

    /// Close a tab. Pinned tabs stay; returns whether a tab was closed.
    pub fn close(&self, path: &str) -> bool {
        let mut tabs = self.inner.write();
        let Some(index) = tabs.tags.iter().position(|t| t.path == path && !t.affix) else {
            return false;
        };
        tabs.tags.remove(index);

        if tabs.active.as_deref() == Some(path) {
            let next = tabs
                .tags
                .get(index)
                .or_else(|| tabs.tags.last())
                .map(|t| t.path.clone());
            tabs.active = next;
        }
        true
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.inner.read().tags.clone()
    }

    pub fn active(&self) -> Option<String> {
        self.inner.read().active.clone()
    }
}

impl SessionReset for TagHistory {
    fn name(&self) -> &str {
        "tags"
    }

    fn reset_session(&self) {
        *self.inner.write() = Tabs::default();
    }
}
