//! # Route Tree
//!
//! Turns the menu graph a server grants to the current user into navigable
//! route nodes, and provides the projections the shell derives from them.
//!
//! ## Features
//!
//! - [`MenuNode`]: server-supplied navigation unit, deserializable from JSON
//! - [`RouteNode`]: client-resolved navigation unit bound to a view
//! - [`ViewRegistry`]: explicit component path to view factory mapping
//! - [`build_routes`]: pure menu graph to route tree conversion
//! - [`project_menus`] and [`flatten`]: projections used by menus and the router
//!
//! Building never performs I/O. A menu entry whose component cannot be found
//! in the registry is reported as a [`RouteBuildError`], never dropped.

mod builder;
mod error;
mod menu;
mod registry;
mod route;

pub use builder::{LabelSource, RouteTreeBuilder, build_routes};
pub use error::RouteBuildError;
pub use menu::MenuNode;
pub use registry::{StaticView, VIEW_ROOT, View, ViewFactory, ViewHandle, ViewRegistry, view_key};
pub use route::{
    Component, ResolvedRoute, RouteMeta, RouteNode, flatten, join_path, project_menus,
};
