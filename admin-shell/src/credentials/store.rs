//! Session token persistence.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::StorageError;
use super::storage::KeyValueStorage;

/// Storage key the session token lives under.
pub const TOKEN_KEY: &str = "access_token";

/// Holds the opaque session token in durable storage.
///
/// Reads never fail: an unavailable backend reads as "no credential".
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            key: TOKEN_KEY.to_string(),
        }
    }

    /// Use a different storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Current token, if one is stored and not blank.
    pub fn get(&self) -> Option<String> {
        match self.storage.get(&self.key) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Credential storage unreadable, treating as signed out");
                None
            }
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Store a freshly issued token.
    pub fn set(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(&self.key, token)?;
        debug!("Credential stored");
        Ok(())
    }

    /// Drop the token. Failures are logged, not propagated.
    pub fn remove(&self) {
        match self.storage.remove(&self.key) {
            Ok(()) => debug!("Credential removed"),
            Err(e) => warn!(error = %e, "Failed to remove credential from storage"),
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("key", &self.key)
            .field("present", &self.is_present())
            .finish()
    }
}
