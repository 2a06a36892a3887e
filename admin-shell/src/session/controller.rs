use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use super::gate::ExpiryGate;
use crate::credentials::CredentialStore;
use crate::permission::PermissionState;
use crate::{Error, Result};

/// What happens once a session expiry is detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Clear the session and go to the login page straight away.
    #[default]
    Immediate,
    /// Ask the user first; nothing is cleared if they decline.
    Confirm,
}

impl ExpiryPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Confirm => "confirm",
        }
    }
}

impl fmt::Display for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "confirm" => Ok(Self::Confirm),
            other => Err(Error::config(format!(
                "unknown expiry policy '{other}', expected 'immediate' or 'confirm'"
            ))),
        }
    }
}

/// Asks the user whether to sign in again.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Resolves once the user answered. May wait indefinitely.
    async fn confirm_relogin(&self) -> bool;
}

/// Forces navigation to the login page.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn to_login(&self) -> Result<()>;
}

/// A per-session store emptied when the session ends.
pub trait SessionReset: Send + Sync {
    fn name(&self) -> &str;
    fn reset_session(&self);
}

/// Receives session-expired responses from the HTTP pipeline.
#[async_trait]
pub trait ExpiryHandler: Send + Sync {
    /// `credential` is the value the failing request was sent with.
    async fn handle_expiry(&self, credential: Option<&str>) -> ExpiryReaction;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another reaction is running.
    InFlight,
    /// The failing request carried no credential, or one that is no longer
    /// stored.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReaction {
    /// Session cleared and navigation to login performed.
    Invalidated,
    /// The user declined to sign in again.
    Declined,
    Skipped(SkipReason),
}

/// Owns the transition from a valid to an invalid session.
pub struct SessionController {
    credentials: CredentialStore,
    permission: Arc<PermissionState>,
    navigator: Arc<dyn Navigator>,
    resets: Vec<Arc<dyn SessionReset>>,
    confirmer: Option<Arc<dyn Confirmer>>,
    policy: ExpiryPolicy,
    gate: ExpiryGate,
}

impl SessionController {
    pub fn new(
        credentials: CredentialStore,
        permission: Arc<PermissionState>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            credentials,
            permission,
            navigator,
            resets: Vec::new(),
            confirmer: None,
            policy: ExpiryPolicy::Immediate,
            gate: ExpiryGate::new(),
        }
    }

    /// Register a store to empty on every invalidation.
    pub fn with_reset(mut self, store: Arc<dyn SessionReset>) -> Self {
        self.resets.push(store);
        self
    }

    /// Switch to [`ExpiryPolicy::Confirm`], asking `confirmer`.
    pub fn with_confirmation(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self.policy = ExpiryPolicy::Confirm;
        self
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    pub fn is_reacting(&self) -> bool {
        self.gate.is_in_flight()
    }

    /// User-initiated sign-out. Always clears the session.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        info!("Signing out");
        self.invalidate().await
    }

    async fn invalidate(&self) -> Result<()> {
        self.credentials.remove();
        for store in &self.resets {
            debug!(store = store.name(), "Resetting session store");
            store.reset_session();
        }
        self.permission.reset();
        self.navigator.to_login().await
    }
}

#[async_trait]
impl ExpiryHandler for SessionController {
    async fn handle_expiry(&self, credential: Option<&str>) -> ExpiryReaction {
        let Some(_permit) = self.gate.try_enter() else {
            debug!("Expiry reaction already running");
            return ExpiryReaction::Skipped(SkipReason::InFlight);
        };

        if credential.is_none() || self.credentials.get().as_deref() != credential {
            debug!("Expired credential is no longer stored");
            return ExpiryReaction::Skipped(SkipReason::Stale);
        }

        if self.policy == ExpiryPolicy::Confirm {
            match &self.confirmer {
                Some(confirmer) => {
                    if !confirmer.confirm_relogin().await {
                        info!("Re-login declined, keeping session state");
                        return ExpiryReaction::Declined;
                    }
                }
                None => warn!("Confirm policy without a confirmer, invalidating immediately"),
            }
        }

        warn!("Session expired, returning to login");
        if let Err(e) = self.invalidate().await {
            error!(error = %e, "Navigation to login failed");
        }
        ExpiryReaction::Invalidated
    }
}
