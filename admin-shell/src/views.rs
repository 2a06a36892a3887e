//! Views shipped with the shell.

use route_tree::ViewRegistry;

/// Component paths of every bundled view.
pub const BUNDLED_VIEWS: &[&str] = &[
    "/workbench",
    "/profile",
    "/login",
    "/error-page/403",
    "/error-page/404",
    "/system/user",
    "/system/role",
    "/system/menu",
    "/system/api",
    "/system/dept",
    "/system/auditlog",
];

/// Registry holding every bundled view.
pub fn default_registry() -> ViewRegistry {
    let mut registry = ViewRegistry::new();
    for path in BUNDLED_VIEWS {
        registry.register_static(path);
    }
    registry
}
