//! Client-resolved route nodes and their projections.

use crate::registry::ViewHandle;

/// What a route renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    /// The application layout shell. Top-level granted routes always render
    /// it and place their child's view inside.
    Layout,
    /// A content view from the registry.
    View(ViewHandle),
}

impl Component {
    #[inline]
    pub fn is_layout(&self) -> bool {
        matches!(self, Self::Layout)
    }

    pub fn view(&self) -> Option<&ViewHandle> {
        match self {
            Self::View(handle) => Some(handle),
            Self::Layout => None,
        }
    }
}

/// Presentation metadata carried by a route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub title: String,
    pub icon: Option<String>,
    pub order: i32,
    pub keep_alive: bool,
    /// Pinned in the tag bar and never closable.
    pub affix: bool,
}

/// A navigable route bound to a component.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteNode {
    pub name: Option<String>,
    pub path: String,
    pub component: Option<Component>,
    pub is_hidden: bool,
    pub redirect: Option<String>,
    pub meta: RouteMeta,
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    /// A route rendering the layout shell.
    pub fn layout(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: path.into(),
            component: Some(Component::Layout),
            ..Default::default()
        }
    }

    /// A route rendering a content view.
    pub fn view(name: impl Into<String>, path: impl Into<String>, view: ViewHandle) -> Self {
        Self {
            name: Some(name.into()),
            path: path.into(),
            component: Some(Component::View(view)),
            ..Default::default()
        }
    }

    /// A route with no component that only forwards elsewhere.
    pub fn forward(name: impl Into<String>, path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            path: path.into(),
            redirect: Some(target.into()),
            is_hidden: true,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = title.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.meta.icon = Some(icon.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.meta.order = order;
        self
    }

    pub fn with_redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    pub fn affixed(mut self) -> Self {
        self.meta.affix = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    /// Whether the route shows up in menus.
    pub fn is_menu_entry(&self) -> bool {
        !self.is_hidden && self.name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Join a child path onto its parent the way nested routes resolve.
///
/// Absolute child paths stand on their own; an empty child path addresses
/// the parent itself.
pub fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return child.to_string();
    }
    if child.is_empty() {
        return if parent.is_empty() {
            "/".to_string()
        } else {
            parent.to_string()
        };
    }
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

/// Named, visible routes ordered by `meta.order`.
///
/// The sort is stable, so entries with equal order keep their declaration
/// order.
pub fn project_menus(routes: &[RouteNode]) -> Vec<RouteNode> {
    let mut menus: Vec<RouteNode> = routes
        .iter()
        .filter(|r| r.is_menu_entry())
        .cloned()
        .collect();
    menus.sort_by_key(|r| r.meta.order);
    menus
}

/// A route record addressed by its full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub name: Option<String>,
    pub full_path: String,
    pub component: Option<Component>,
    pub redirect: Option<String>,
    pub is_hidden: bool,
    pub meta: RouteMeta,
    /// Nesting depth, 0 for top-level routes.
    pub depth: usize,
}

/// Flatten a route tree into records, parents before their children.
pub fn flatten(routes: &[RouteNode]) -> Vec<ResolvedRoute> {
    let mut out = Vec::new();
    for route in routes {
        flatten_into(route, "", 0, &mut out);
    }
    out
}

fn flatten_into(route: &RouteNode, parent: &str, depth: usize, out: &mut Vec<ResolvedRoute>) {
    let full_path = if depth == 0 {
        route.path.clone()
    } else {
        join_path(parent, &route.path)
    };

    out.push(ResolvedRoute {
        name: route.name.clone(),
        full_path: full_path.clone(),
        component: route.component.clone(),
        redirect: route.redirect.clone(),
        is_hidden: route.is_hidden,
        meta: route.meta.clone(),
        depth,
    });

    for child in &route.children {
        flatten_into(child, &full_path, depth + 1, out);
    }
}
