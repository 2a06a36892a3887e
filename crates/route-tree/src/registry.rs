//! View registry.
//!
//! Views are registered once at startup under their component path. The
//! builder only performs lookups; it never discovers views on its own.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RouteBuildError;

/// Prefix every component path is joined to when forming a registry key.
pub const VIEW_ROOT: &str = "/views";

/// A loaded view module.
pub trait View: Send + Sync + fmt::Debug {
    /// Registry key the view was loaded from.
    fn key(&self) -> &str;
}

/// Lazily produces a view when a route is rendered.
pub type ViewFactory = Arc<dyn Fn() -> Arc<dyn View> + Send + Sync>;

/// A view with no behaviour beyond its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticView {
    key: String,
}

impl StaticView {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl View for StaticView {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Normalize a component path into a registry key.
///
/// `system/user/`, `/system/user` and ` /system/user ` all map to
/// `/views/system/user`.
pub fn view_key(component_ref: &str) -> String {
    let trimmed = component_ref.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return VIEW_ROOT.to_string();
    }
    if trimmed.starts_with('/') {
        format!("{VIEW_ROOT}{trimmed}")
    } else {
        format!("{VIEW_ROOT}/{trimmed}")
    }
}

/// Lazy reference to a registered view.
///
/// Two handles are equal when they point at the same registry key.
#[derive(Clone)]
pub struct ViewHandle {
    key: String,
    factory: ViewFactory,
}

impl ViewHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the view.
    pub fn load(&self) -> Arc<dyn View> {
        (self.factory)()
    }
}

impl PartialEq for ViewHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ViewHandle {}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ViewHandle").field(&self.key).finish()
    }
}

/// Mapping from normalized component path to view factory.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: BTreeMap<String, ViewFactory>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view factory under a component path.
    ///
    /// Registering the same path twice replaces the earlier factory.
    pub fn register(&mut self, component_path: &str, factory: ViewFactory) -> &mut Self {
        self.views.insert(view_key(component_path), factory);
        self
    }

    /// Register a [`StaticView`] for a component path.
    pub fn register_static(&mut self, component_path: &str) -> &mut Self {
        let key = view_key(component_path);
        let view: Arc<dyn View> = Arc::new(StaticView::new(key.clone()));
        self.views.insert(key, Arc::new(move || Arc::clone(&view)));
        self
    }

    /// Builder-style variant of [`register_static`](Self::register_static).
    pub fn with_static(mut self, component_path: &str) -> Self {
        self.register_static(component_path);
        self
    }

    /// Look up the view for a component path.
    pub fn get(&self, component_ref: &str) -> Option<ViewHandle> {
        let key = view_key(component_ref);
        self.views.get(&key).map(|factory| ViewHandle {
            key,
            factory: Arc::clone(factory),
        })
    }

    /// Look up the view for a route, reporting a configuration fault when it
    /// is missing.
    pub fn resolve(&self, route: &str, component_ref: &str) -> Result<ViewHandle, RouteBuildError> {
        self.get(component_ref)
            .ok_or_else(|| RouteBuildError::UnresolvedView {
                route: route.to_string(),
                component: component_ref.to_string(),
                key: view_key(component_ref),
            })
    }

    pub fn contains(&self, component_ref: &str) -> bool {
        self.views.contains_key(&view_key(component_ref))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.views.keys()).finish()
    }
}
