//! Path resolution and guarded navigation.
//!
//! The router resolves paths against the effective route table
//! (static routes followed by granted ones), runs each transition through
//! the [`GuardPipeline`] and records where the user ended up.

mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use route_tree::{ResolvedRoute, flatten};
use tracing::{debug, info, instrument, warn};

pub use routes::basic_routes;

use crate::guard::{GuardPipeline, Location, Transition, TransitionOutcome};
use crate::permission::PermissionState;
use crate::session::Navigator;
use crate::{Error, Result};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const NOT_FOUND_PATH: &str = "/404";

/// Redirect hops one navigation may take, route-level and guard redirects
/// combined.
pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone)]
struct Current {
    location: Location,
    route: ResolvedRoute,
}

pub struct Router {
    permission: Arc<PermissionState>,
    guards: GuardPipeline,
    current: RwLock<Option<Current>>,
}

impl Router {
    pub fn new(permission: Arc<PermissionState>, guards: GuardPipeline) -> Self {
        Self {
            permission,
            guards,
            current: RwLock::new(None),
        }
    }

    /// Route record registered at exactly `path`.
    ///
    /// A layout and its default child share a path; the deepest record wins.
    pub fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        flatten(&self.permission.routes())
            .into_iter()
            .filter(|r| r.full_path == path)
            .max_by_key(|r| r.depth)
    }

    pub fn current(&self) -> Option<Location> {
        self.current.read().as_ref().map(|c| c.location.clone())
    }

    pub fn current_route(&self) -> Option<ResolvedRoute> {
        self.current.read().as_ref().map(|c| c.route.clone())
    }

    /// Navigate to `target` (`path?query`).
    pub async fn navigate(&self, target: &str) -> Result<TransitionOutcome> {
        self.navigate_to(Location::parse(target)).await
    }

    #[instrument(skip(self, target), fields(target = %target))]
    pub async fn navigate_to(&self, target: Location) -> Result<TransitionOutcome> {
        let origin = target.path.clone();
        let mut hops = 0;
        let mut location = target;

        loop {
            let (to, route) = self.lookup(location, &origin, &mut hops)?;
            let transition = Transition {
                to,
                from: self.current(),
                route,
            };

            match self.guards.run(&transition).await {
                TransitionOutcome::Committed(route) => {
                    info!(path = %transition.to, "Navigation committed");
                    *self.current.write() = Some(Current {
                        location: transition.to,
                        route: route.clone(),
                    });
                    return Ok(TransitionOutcome::Committed(route));
                }
                TransitionOutcome::Redirected(next) => {
                    count_hop(&mut hops, &origin)?;
                    location = next;
                }
                TransitionOutcome::Failed(reason) => {
                    warn!(path = %transition.to, %reason, "Navigation failed");
                    return Ok(TransitionOutcome::Failed(reason));
                }
            }
        }
    }

    /// Follow route-level redirects; unknown paths land on the not-found
    /// route while keeping the requested location.
    fn lookup(
        &self,
        mut location: Location,
        origin: &str,
        hops: &mut usize,
    ) -> Result<(Location, ResolvedRoute)> {
        loop {
            let Some(route) = self.resolve(&location.path) else {
                debug!(path = %location.path, "No route matches, using not-found route");
                let fallback = self.resolve(NOT_FOUND_PATH).ok_or_else(|| {
                    Error::config(format!(
                        "no route matches '{}' and no {NOT_FOUND_PATH} route is registered",
                        location.path
                    ))
                })?;
                return Ok((location, fallback));
            };

            let Some(redirect) = route.redirect.as_deref() else {
                return Ok((location, route));
            };
            count_hop(hops, origin)?;
            let query = std::mem::take(&mut location.query);
            location = Location::parse(redirect);
            location.query.extend(query);
        }
    }
}

fn count_hop(hops: &mut usize, origin: &str) -> Result<()> {
    *hops += 1;
    if *hops > MAX_REDIRECTS {
        return Err(Error::RedirectLoop {
            path: origin.to_string(),
            limit: MAX_REDIRECTS,
        });
    }
    Ok(())
}

#[async_trait]
impl Navigator for Router {
    async fn to_login(&self) -> Result<()> {
        let mut login = Location::new(LOGIN_PATH);
        if let Some(current) = self.current().filter(|c| c.path != LOGIN_PATH) {
            login.query = current.query;
            login.query.insert("redirect".to_string(), current.path);
        }

        match self.navigate_to(login).await? {
            TransitionOutcome::Failed(reason) => Err(Error::Other(reason)),
            _ => Ok(()),
        }
    }
}
