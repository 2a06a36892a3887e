use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use route_tree::{LabelSource, RouteNode, RouteTreeBuilder, ViewRegistry, project_menus};
use tracing::{debug, info, instrument};

use super::apis::AllowedApiSet;
use super::source::PermissionSource;
use crate::{Error, Result};

#[derive(Default)]
struct Granted {
    routes: Vec<RouteNode>,
    apis: AllowedApiSet,
}

/// Routes and API identifiers granted to the current session.
///
/// Granted routes are replaced wholesale on every
/// [`generate_routes`](Self::generate_routes), never patched. Each fetch
/// takes a generation number before it suspends; a completion that is no
/// longer the latest (a newer fetch or a [`reset`](Self::reset) happened in
/// the meantime) is discarded with [`Error::Superseded`].
pub struct PermissionState {
    registry: Arc<ViewRegistry>,
    labels: Option<Arc<dyn LabelSource>>,
    static_routes: Vec<RouteNode>,
    granted: RwLock<Granted>,
    route_generation: AtomicU64,
    api_generation: AtomicU64,
}

impl PermissionState {
    pub fn new(registry: Arc<ViewRegistry>, static_routes: Vec<RouteNode>) -> Self {
        Self {
            registry,
            labels: None,
            static_routes,
            granted: RwLock::new(Granted::default()),
            route_generation: AtomicU64::new(0),
            api_generation: AtomicU64::new(0),
        }
    }

    /// Override route titles from an external label source.
    pub fn with_labels(mut self, labels: Arc<dyn LabelSource>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// Fetch the menu graph, rebuild the granted routes and store them.
    #[instrument(skip_all)]
    pub async fn generate_routes(&self, source: &dyn PermissionSource) -> Result<Vec<RouteNode>> {
        let generation = self.route_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let menus = source.fetch_menus().await?;
        let mut builder = RouteTreeBuilder::new(&self.registry);
        if let Some(labels) = self.labels.as_deref() {
            builder = builder.with_labels(labels);
        }
        let routes = builder.build(&menus)?;

        let mut granted = self.granted.write();
        if self.route_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding superseded route generation");
            return Err(Error::Superseded { generation });
        }
        granted.routes = routes.clone();

        info!(generation, routes = routes.len(), "Granted routes replaced");
        Ok(routes)
    }

    /// Fetch and store the API identifiers granted to the session.
    #[instrument(skip_all)]
    pub async fn get_access_apis(&self, source: &dyn PermissionSource) -> Result<AllowedApiSet> {
        let generation = self.api_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let apis: AllowedApiSet = source.fetch_apis().await?.into_iter().collect();

        let mut granted = self.granted.write();
        if self.api_generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding superseded API grant");
            return Err(Error::Superseded { generation });
        }
        granted.apis = apis.clone();

        info!(generation, apis = apis.len(), "Granted APIs replaced");
        Ok(apis)
    }

    /// Drop everything granted. Static routes stay.
    pub fn reset(&self) {
        // Bump first so in-flight fetches cannot land after the clear.
        self.route_generation.fetch_add(1, Ordering::SeqCst);
        self.api_generation.fetch_add(1, Ordering::SeqCst);

        let mut granted = self.granted.write();
        granted.routes.clear();
        granted.apis = AllowedApiSet::default();
        debug!("Permission state reset");
    }

    pub fn static_routes(&self) -> &[RouteNode] {
        &self.static_routes
    }

    pub fn granted_routes(&self) -> Vec<RouteNode> {
        self.granted.read().routes.clone()
    }

    /// Effective navigable set: static routes followed by granted ones.
    pub fn routes(&self) -> Vec<RouteNode> {
        let granted = self.granted.read();
        self.static_routes
            .iter()
            .chain(granted.routes.iter())
            .cloned()
            .collect()
    }

    pub fn menus(&self) -> Vec<RouteNode> {
        project_menus(&self.routes())
    }

    pub fn apis(&self) -> AllowedApiSet {
        self.granted.read().apis.clone()
    }

    /// Whether the UI should offer an action backed by `api`.
    pub fn has_permission(&self, api: &str, is_superuser: bool) -> Result<bool> {
        if api.trim().is_empty() {
            return Err(Error::validation(
                "permission check needs an API identifier such as get/api/v1/user/list",
            ));
        }
        Ok(is_superuser || self.granted.read().apis.contains(api))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ApiError, ErrorCode};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use route_tree::MenuNode;
    use serde_json::Value;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    type Script = (Vec<MenuNode>, Option<oneshot::Receiver<()>>);

    #[derive(Default)]
    struct ScriptedSource {
        menus: Mutex<VecDeque<Script>>,
        apis: Vec<String>,
        fail: bool,
    }

    impl ScriptedSource {
        fn with_menus(menus: Vec<Vec<MenuNode>>) -> Self {
            Self {
                menus: Mutex::new(menus.into_iter().map(|m| (m, None)).collect()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PermissionSource for ScriptedSource {
        async fn fetch_menus(&self) -> std::result::Result<Vec<MenuNode>, ApiError> {
            if self.fail {
                return Err(ApiError::new(ErrorCode::Status(500), "boom", Value::Null));
            }
            let (menus, gate) = self.menus.lock().pop_front().unwrap_or_default();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(menus)
        }

        async fn fetch_apis(&self) -> std::result::Result<Vec<String>, ApiError> {
            Ok(self.apis.clone())
        }
    }

    fn registry() -> Arc<ViewRegistry> {
        Arc::new(
            ViewRegistry::new()
                .with_static("/login")
                .with_static("/dashboard")
                .with_static("/system/user"),
        )
    }

    fn state() -> PermissionState {
        let registry = registry();
        let login = registry.resolve("Login", "/login").unwrap();
        let statics = vec![RouteNode::view("Login", "/login", login).hidden()];
        PermissionState::new(registry, statics)
    }

    fn dashboard() -> Vec<MenuNode> {
        vec![MenuNode::new("Dashboard", "/dashboard", "/dashboard").with_order(1)]
    }

    fn system() -> Vec<MenuNode> {
        vec![
            MenuNode::new("System", "/system", "Layout").with_children(vec![MenuNode::new(
                "Users",
                "user",
                "/system/user",
            )]),
        ]
    }

    #[tokio::test]
    async fn test_generate_routes_replaces_wholesale() {
        let state = state();
        let source = ScriptedSource::with_menus(vec![dashboard(), system()]);

        state.generate_routes(&source).await.unwrap();
        assert_eq!(state.granted_routes()[0].path, "/dashboard");

        state.generate_routes(&source).await.unwrap();
        let granted = state.granted_routes();
        assert_eq!(granted.len(), 1);
        assert_eq!(granted[0].path, "/system");
    }

    #[tokio::test]
    async fn test_generate_routes_idempotent() {
        let state = state();
        let source = ScriptedSource::with_menus(vec![dashboard(), dashboard()]);

        let first = state.generate_routes(&source).await.unwrap();
        let second = state.generate_routes(&source).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_routes_and_menus_projection() {
        let state = state();
        let source = ScriptedSource::with_menus(vec![dashboard()]);
        state.generate_routes(&source).await.unwrap();

        let paths: Vec<_> = state.routes().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/login", "/dashboard"]);

        let menus: Vec<_> = state.menus().into_iter().filter_map(|r| r.name).collect();
        assert_eq!(menus, vec!["Dashboard"]);
    }

    #[tokio::test]
    async fn test_unresolved_view_is_fatal() {
        let state = state();
        let source = ScriptedSource::with_menus(vec![vec![MenuNode::new(
            "Audit",
            "/audit",
            "/system/auditlog",
        )]]);

        let err = state.generate_routes(&source).await.unwrap_err();
        assert!(err.is_configuration_fault());
        assert!(state.granted_routes().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_grant() {
        let state = state();
        state
            .generate_routes(&ScriptedSource::with_menus(vec![dashboard()]))
            .await
            .unwrap();

        let failing = ScriptedSource {
            fail: true,
            ..Default::default()
        };
        assert!(matches!(
            state.generate_routes(&failing).await,
            Err(Error::Api(_))
        ));
        assert_eq!(state.granted_routes().len(), 1);
    }

    #[tokio::test]
    async fn test_superseded_generation_is_discarded() {
        let state = state();
        let (release, gate) = oneshot::channel();
        let source = ScriptedSource {
            menus: Mutex::new(VecDeque::from(vec![
                (dashboard(), Some(gate)),
                (system(), None),
            ])),
            ..Default::default()
        };

        let (stale, fresh, _) = tokio::join!(
            state.generate_routes(&source),
            state.generate_routes(&source),
            async {
                let _ = release.send(());
            }
        );

        assert!(matches!(stale, Err(Error::Superseded { generation: 1 })));
        assert_eq!(fresh.unwrap()[0].path, "/system");
        assert_eq!(state.granted_routes()[0].path, "/system");
    }

    #[tokio::test]
    async fn test_reset_clears_grants_keeps_static() {
        let state = state();
        let source = ScriptedSource {
            menus: Mutex::new(VecDeque::from(vec![(dashboard(), None)])),
            apis: vec!["get/api/v1/user/list".to_string()],
            ..Default::default()
        };
        state.generate_routes(&source).await.unwrap();
        state.get_access_apis(&source).await.unwrap();
        assert!(!state.apis().is_empty());

        state.reset();

        assert!(state.granted_routes().is_empty());
        assert!(state.apis().is_empty());
        assert!(state.menus().is_empty());
        assert_eq!(state.routes().len(), 1);
        assert_eq!(state.routes()[0].path, "/login");
    }

    #[tokio::test]
    async fn test_has_permission() {
        let state = state();
        let source = ScriptedSource {
            apis: vec!["get/api/v1/user/list".to_string()],
            ..Default::default()
        };
        state.get_access_apis(&source).await.unwrap();

        assert!(state.has_permission("get/api/v1/user/list", false).unwrap());
        assert!(!state.has_permission("post/api/v1/user/create", false).unwrap());
        assert!(state.has_permission("post/api/v1/user/create", true).unwrap());
        assert!(state.has_permission("", true).is_err());
    }
}
