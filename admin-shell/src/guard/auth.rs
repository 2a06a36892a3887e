use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{Guard, GuardDecision, Location, Transition};
use crate::Result;
use crate::credentials::CredentialStore;
use crate::router::{HOME_PATH, LOGIN_PATH};

/// A path reachable without a credential.
#[derive(Debug, Clone)]
pub enum PublicRoute {
    Literal(String),
    Pattern(Regex),
}

impl PublicRoute {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Literal(literal) => literal == path,
            Self::Pattern(pattern) => pattern.is_match(path),
        }
    }
}

/// Allow-list consulted for visitors without a credential.
#[derive(Debug, Clone)]
pub struct PublicRoutes {
    routes: Vec<PublicRoute>,
}

impl PublicRoutes {
    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn with_literal(mut self, path: impl Into<String>) -> Self {
        self.routes.push(PublicRoute::Literal(path.into()));
        self
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.routes.push(PublicRoute::Pattern(pattern));
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        self.routes.iter().any(|r| r.matches(path))
    }
}

impl Default for PublicRoutes {
    fn default() -> Self {
        let routes = Self::empty()
            .with_literal(LOGIN_PATH)
            .with_literal("/404")
            .with_literal("/forgot-password");
        match Regex::new(r"^/reset-password/.*") {
            Ok(pattern) => routes.with_pattern(pattern),
            Err(_) => routes,
        }
    }
}

/// Sends visitors without a credential to the login page, and signed-in
/// users away from it.
pub struct AuthGuard {
    credentials: CredentialStore,
    public: PublicRoutes,
}

impl AuthGuard {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            credentials,
            public: PublicRoutes::default(),
        }
    }

    pub fn with_public_routes(mut self, public: PublicRoutes) -> Self {
        self.public = public;
        self
    }
}

#[async_trait]
impl Guard for AuthGuard {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn before_each(&self, transition: &Transition) -> Result<GuardDecision> {
        let to = &transition.to;

        if !self.credentials.is_present() {
            if self.public.matches(&to.path) {
                return Ok(GuardDecision::Allow);
            }
            debug!(path = %to.path, "No credential, redirecting to login");
            let mut login = Location::new(LOGIN_PATH);
            login.query = to.query.clone();
            login.query.insert("redirect".to_string(), to.path.clone());
            return Ok(GuardDecision::Redirect(login));
        }

        if to.path == LOGIN_PATH {
            return Ok(GuardDecision::Redirect(Location::new(HOME_PATH)));
        }
        Ok(GuardDecision::Allow)
    }
}
