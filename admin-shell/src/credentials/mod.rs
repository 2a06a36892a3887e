//! Credential management module.
//!
//! The shell holds a single opaque session token. It has no client-side
//! structure or expiry: the token is valid until the server answers 401.
//!
//! # Architecture
//!
//! - [`KeyValueStorage`]: durable string-keyed storage backend
//! - [`MemoryStorage`] / [`FileStorage`]: the provided backends
//! - [`CredentialStore`]: get/set/remove of the session token on top of a backend

mod error;
mod storage;
mod store;

pub use error::StorageError;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{CredentialStore, TOKEN_KEY};
