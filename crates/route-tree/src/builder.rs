//! Menu graph to route tree conversion.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::RouteBuildError;
use crate::menu::MenuNode;
use crate::registry::ViewRegistry;
use crate::route::{Component, RouteMeta, RouteNode};

/// External source of display labels, e.g. a localization table.
pub trait LabelSource: Send + Sync {
    /// Label for the node, or `None` to fall back to its name.
    fn label(&self, node: &MenuNode) -> Option<String>;
}

/// Builds granted routes from the server menu graph.
pub struct RouteTreeBuilder<'a> {
    registry: &'a ViewRegistry,
    labels: Option<&'a dyn LabelSource>,
}

impl<'a> RouteTreeBuilder<'a> {
    pub fn new(registry: &'a ViewRegistry) -> Self {
        Self {
            registry,
            labels: None,
        }
    }

    pub fn with_labels(mut self, labels: &'a dyn LabelSource) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Build one layout route per top-level menu node.
    pub fn build(&self, menus: &[MenuNode]) -> Result<Vec<RouteNode>, RouteBuildError> {
        ensure_unique_paths("/", menus)?;

        let routes = menus
            .iter()
            .map(|node| self.build_top_level(node))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = routes.len(), "Built granted routes");
        Ok(routes)
    }

    fn build_top_level(&self, node: &MenuNode) -> Result<RouteNode, RouteBuildError> {
        let children = if node.children.is_empty() {
            // The layout renders no content itself, so a leaf needs a child
            // to be navigable at its own path.
            let view = self.registry.resolve(&node.name, &node.component_ref)?;
            vec![RouteNode {
                name: Some(format!("{}Default", node.name)),
                path: String::new(),
                component: Some(Component::View(view)),
                is_hidden: true,
                redirect: None,
                meta: self.meta(node),
                children: Vec::new(),
            }]
        } else {
            ensure_unique_paths(&node.path, &node.children)?;
            node.children
                .iter()
                .map(|child| self.build_leaf(&node.path, child))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(RouteNode {
            name: Some(node.name.clone()),
            path: node.path.clone(),
            component: Some(Component::Layout),
            is_hidden: node.is_hidden,
            redirect: node.redirect.clone(),
            meta: self.meta(node),
            children,
        })
    }

    fn build_leaf(&self, parent: &str, node: &MenuNode) -> Result<RouteNode, RouteBuildError> {
        if !node.children.is_empty() {
            warn!(
                parent = %parent,
                route = %node.name,
                ignored = node.children.len(),
                "Menu nesting below the second level is not rendered"
            );
        }

        let view = self.registry.resolve(&node.name, &node.component_ref)?;
        Ok(RouteNode {
            name: Some(node.name.clone()),
            path: node.path.clone(),
            component: Some(Component::View(view)),
            is_hidden: node.is_hidden,
            redirect: node.redirect.clone(),
            meta: self.meta(node),
            children: Vec::new(),
        })
    }

    fn meta(&self, node: &MenuNode) -> RouteMeta {
        let title = self
            .labels
            .and_then(|labels| labels.label(node))
            .unwrap_or_else(|| node.name.clone());

        RouteMeta {
            title,
            icon: node.icon.clone(),
            order: node.order,
            keep_alive: node.keepalive,
            affix: false,
        }
    }
}

/// Build granted routes with default labels.
pub fn build_routes(
    menus: &[MenuNode],
    registry: &ViewRegistry,
) -> Result<Vec<RouteNode>, RouteBuildError> {
    RouteTreeBuilder::new(registry).build(menus)
}

fn ensure_unique_paths(parent: &str, siblings: &[MenuNode]) -> Result<(), RouteBuildError> {
    let mut seen = HashSet::with_capacity(siblings.len());
    for node in siblings {
        if !seen.insert(node.path.as_str()) {
            return Err(RouteBuildError::DuplicatePath {
                parent: parent.to_string(),
                path: node.path.clone(),
            });
        }
    }
    Ok(())
}
