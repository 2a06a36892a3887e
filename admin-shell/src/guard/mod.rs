//! Navigation guards.
//!
//! Every route transition runs through a [`GuardPipeline`]: an ordered chain
//! of [`Guard`]s consulted before the transition commits and notified after
//! it settled.
//!
//! # Architecture
//!
//! - `before_each` runs for every guard in declaration order; the first
//!   non-allow decision decides the outcome, later guards still run.
//! - `after_each` runs for every guard in reverse declaration order,
//!   whatever the outcome, so the outermost guard finishes last.
//! - Guards read shared state on every call and cache nothing between
//!   transitions.

mod auth;
mod loading;
mod title;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use route_tree::ResolvedRoute;
use tracing::{debug, warn};
use url::form_urlencoded;

pub use auth::{AuthGuard, PublicRoute, PublicRoutes};
pub use loading::{LoadingGuard, LoadingIndicator, LoadingState};
pub use title::{DocumentTitle, TitleGuard, TitleSink, format_title};

use crate::Result;
use crate::credentials::CredentialStore;

/// A navigation target: path plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            path,
            query: BTreeMap::new(),
        }
    }

    /// Parse `path?query`. Query values are URL-decoded.
    pub fn parse(target: &str) -> Self {
        let target = target.split('#').next().unwrap_or_default();
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        let mut location = Self::new(path);
        location.query = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        location
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

impl From<&str> for Location {
    fn from(target: &str) -> Self {
        Self::parse(target)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// One attempted route transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub to: Location,
    pub from: Option<Location>,
    /// Route record `to` resolved to.
    pub route: ResolvedRoute,
}

/// A guard's verdict on a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Location),
}

/// How a transition settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Committed(ResolvedRoute),
    Redirected(Location),
    Failed(String),
}

impl TransitionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

#[async_trait]
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decide on a transition before it commits.
    async fn before_each(&self, _transition: &Transition) -> Result<GuardDecision> {
        Ok(GuardDecision::Allow)
    }

    /// Observe the settled transition.
    async fn after_each(&self, _transition: &Transition, _outcome: &TransitionOutcome) {}
}

/// Ordered guard chain.
#[derive(Clone, Default)]
pub struct GuardPipeline {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loading, auth and title guards, in that order.
    pub fn default_chain(
        credentials: CredentialStore,
        loading: Arc<dyn LoadingIndicator>,
        title: Arc<dyn TitleSink>,
        app_title: impl Into<String>,
    ) -> Self {
        Self::new()
            .with_guard(Arc::new(LoadingGuard::new(loading)))
            .with_guard(Arc::new(AuthGuard::new(credentials)))
            .with_guard(Arc::new(TitleGuard::new(title, app_title)))
    }

    pub fn with_guard(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Run a transition through every guard.
    pub async fn run(&self, transition: &Transition) -> TransitionOutcome {
        let mut outcome: Option<TransitionOutcome> = None;

        for guard in &self.guards {
            let decision = guard.before_each(transition).await;
            if outcome.is_some() {
                continue;
            }
            match decision {
                Ok(GuardDecision::Allow) => {}
                Ok(GuardDecision::Redirect(target)) => {
                    debug!(guard = guard.name(), from = %transition.to, to = %target, "Guard redirected");
                    outcome = Some(TransitionOutcome::Redirected(target));
                }
                Err(e) => {
                    warn!(guard = guard.name(), error = %e, "Guard failed");
                    outcome = Some(TransitionOutcome::Failed(e.to_string()));
                }
            }
        }

        let outcome =
            outcome.unwrap_or_else(|| TransitionOutcome::Committed(transition.route.clone()));

        for guard in self.guards.iter().rev() {
            guard.after_each(transition, &outcome).await;
        }
        outcome
    }
}
