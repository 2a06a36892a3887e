//! Permission state.
//!
//! Holds what the server granted the current user: the menu-derived route
//! tree and the set of API identifiers. Both are advisory: they decide what
//! the UI offers, the server still enforces every call.

mod apis;
mod source;
mod state;

pub use apis::{AllowedApiSet, api_identifier};
pub use source::PermissionSource;
pub use state::PermissionState;
