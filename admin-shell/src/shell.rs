//! Application shell wiring.
//!
//! # Architecture
//!
//! - Construction order: credentials, permission state, router, session
//!   controller, HTTP pipeline, API client. The pipeline hands 401 responses
//!   to the controller, which navigates through the router.
//! - The permission state is populated from the API client passed in at call
//!   time, so no component holds a reference back to the pipeline.
//! - Per-session stores (user profile, tag history) register with the
//!   controller and are emptied on every invalidation.

use std::sync::Arc;

use route_tree::{RouteNode, ViewRegistry};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, LoginRequest};
use crate::config::ShellConfig;
use crate::credentials::{CredentialStore, FileStorage, KeyValueStorage, MemoryStorage};
use crate::guard::{DocumentTitle, GuardPipeline, Location, LoadingState, TransitionOutcome};
use crate::http::{HttpPipeline, Notifier, ReqwestTransport, TracingNotifier, Transport};
use crate::permission::PermissionState;
use crate::router::{HOME_PATH, Router, basic_routes};
use crate::session::{Confirmer, ExpiryPolicy, SessionController};
use crate::tags::{Tag, TagHistory};
use crate::user::{UserInfo, UserStore};
use crate::views::default_registry;
use crate::{Error, Result};

/// Collaborators the shell can be given instead of its defaults.
pub struct AppShellBuilder {
    config: ShellConfig,
    transport: Option<Arc<dyn Transport>>,
    storage: Option<Arc<dyn KeyValueStorage>>,
    notifier: Option<Arc<dyn Notifier>>,
    confirmer: Option<Arc<dyn Confirmer>>,
    registry: Option<ViewRegistry>,
}

impl AppShellBuilder {
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Used when the expiry policy is `confirm`.
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    pub fn with_registry(mut self, registry: ViewRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<AppShell> {
        let config = self.config;
        config.validate()?;

        let storage: Arc<dyn KeyValueStorage> = match (self.storage, &config.storage_path) {
            (Some(storage), _) => storage,
            (None, Some(path)) => Arc::new(FileStorage::new(path)),
            (None, None) => Arc::new(MemoryStorage::new()),
        };
        let credentials = CredentialStore::new(storage);

        let registry = Arc::new(self.registry.unwrap_or_else(default_registry));
        let statics = basic_routes(&registry)?;
        let permission = Arc::new(PermissionState::new(registry, statics));

        let loading = Arc::new(LoadingState::new());
        let title = Arc::new(DocumentTitle::new(config.app_title.clone()));
        let guards = GuardPipeline::default_chain(
            credentials.clone(),
            loading.clone(),
            title.clone(),
            config.app_title.clone(),
        );
        let router = Arc::new(Router::new(permission.clone(), guards));

        let user = Arc::new(UserStore::new());
        let tags = Arc::new(TagHistory::new());
        let mut controller =
            SessionController::new(credentials.clone(), permission.clone(), router.clone())
                .with_reset(tags.clone())
                .with_reset(user.clone());
        if config.expiry_policy == ExpiryPolicy::Confirm {
            match self.confirmer {
                Some(confirmer) => controller = controller.with_confirmation(confirmer),
                None => warn!("Expiry policy 'confirm' without a confirmer, using 'immediate'"),
            }
        }
        let session = Arc::new(controller);

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config.base_url()?, config.timeout)?),
        };
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier) as Arc<dyn Notifier>);
        let pipeline = HttpPipeline::new(transport, credentials.clone(), notifier)
            .with_options(config.pipeline_options()?)
            .with_expiry_handler(session.clone());
        let api = ApiClient::new(Arc::new(pipeline));

        info!(
            environment = %config.environment,
            policy = %session.policy(),
            "Admin shell ready"
        );

        Ok(AppShell {
            config,
            credentials,
            permission,
            router,
            session,
            api,
            user,
            tags,
            loading,
            title,
        })
    }
}

pub struct AppShell {
    config: ShellConfig,
    credentials: CredentialStore,
    permission: Arc<PermissionState>,
    router: Arc<Router>,
    session: Arc<SessionController>,
    api: ApiClient,
    user: Arc<UserStore>,
    tags: Arc<TagHistory>,
    loading: Arc<LoadingState>,
    title: Arc<DocumentTitle>,
}

impl AppShell {
    pub fn builder(config: ShellConfig) -> AppShellBuilder {
        AppShellBuilder {
            config,
            transport: None,
            storage: None,
            notifier: None,
            confirmer: None,
            registry: None,
        }
    }

    /// Populate the session from a stored credential.
    ///
    /// Loads the profile, the granted routes and the granted APIs. Without a
    /// credential this does nothing. Any failure signs the user out, except
    /// being overtaken by a concurrent bootstrap.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<()> {
        if !self.credentials.is_present() {
            return Ok(());
        }

        match self.load_session().await {
            Ok(()) => Ok(()),
            Err(Error::Superseded { generation }) => {
                // A newer bootstrap owns the permission state now.
                debug!(generation, "Session bootstrap overtaken");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Session bootstrap failed");
                // A 401 may already have ended the session.
                if self.credentials.is_present()
                    && let Err(logout_err) = self.session.logout().await
                {
                    warn!(error = %logout_err, "Sign-out after failed bootstrap failed");
                }
                Err(e)
            }
        }
    }

    async fn load_session(&self) -> Result<()> {
        let info = self.api.user_info().await?;
        self.user.set(info);
        futures::try_join!(
            self.permission.generate_routes(&self.api),
            self.permission.get_access_apis(&self.api),
        )?;
        Ok(())
    }

    /// Sign in, load the session and continue to where the user was headed.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TransitionOutcome> {
        let response = self
            .api
            .login(&LoginRequest::new(username, password))
            .await?;
        self.credentials.set(&response.access_token)?;
        info!(username = %response.username, "Signed in");

        self.bootstrap().await?;

        let mut target = Location::new(HOME_PATH);
        if let Some(mut current) = self.router.current()
            && let Some(redirect) = current.query.remove("redirect")
        {
            target = Location::parse(&redirect);
            target.query.extend(current.query);
        }
        self.navigate_to(target).await
    }

    /// User-initiated sign-out.
    pub async fn logout(&self) -> Result<()> {
        self.session.logout().await
    }

    pub async fn navigate(&self, target: &str) -> Result<TransitionOutcome> {
        self.navigate_to(Location::parse(target)).await
    }

    async fn navigate_to(&self, target: Location) -> Result<TransitionOutcome> {
        let outcome = self.router.navigate_to(target).await?;
        if let TransitionOutcome::Committed(route) = &outcome {
            // Standalone hidden pages (login, error pages) get no tab.
            if route.depth > 0 || !route.is_hidden {
                self.tags.visit(Tag::from_route(route));
            }
        }
        Ok(outcome)
    }

    pub fn menus(&self) -> Vec<RouteNode> {
        self.permission.menus()
    }

    /// Whether the signed-in user may use the action behind `api`.
    pub fn has_permission(&self, api: &str) -> Result<bool> {
        self.permission.has_permission(api, self.user.is_superuser())
    }

    pub fn current(&self) -> Option<Location> {
        self.router.current()
    }

    pub fn title(&self) -> String {
        self.title.get()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.user.get()
    }

    pub fn tags(&self) -> &TagHistory {
        &self.tags
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn permission(&self) -> &PermissionState {
        &self.permission
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }
}
