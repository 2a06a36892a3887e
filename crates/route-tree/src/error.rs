use thiserror::Error;

/// Configuration faults detected while building a route tree.
///
/// These indicate a mismatch between what the server grants and what the
/// client was compiled with. They are not recoverable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteBuildError {
    #[error("route '{route}' references unknown view '{component}' (registry key '{key}')")]
    UnresolvedView {
        route: String,
        component: String,
        key: String,
    },
    #[error("duplicate path '{path}' under '{parent}'")]
    DuplicatePath { parent: String, path: String },
}
