//! admin-shell library crate.
//!
//! Client-side shell for permission-gated admin consoles: builds the route
//! table from server-granted menus, guards every navigation, and runs all
//! server calls through a pipeline that handles session expiry exactly once
//! per storm of concurrent 401 responses.

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod http;
pub mod logging;
pub mod permission;
pub mod router;
pub mod session;
pub mod shell;
pub mod tags;
pub mod user;
pub mod views;

pub use error::{Error, Result};
pub use shell::AppShell;
