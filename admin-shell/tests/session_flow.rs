//! End-to-end flows through the shell against an in-process transport.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use admin_shell::AppShell;
use admin_shell::api::UpdatePasswordRequest;
use admin_shell::config::ShellConfig;
use admin_shell::credentials::{CredentialStore, KeyValueStorage, MemoryStorage, StorageError};
use admin_shell::guard::TransitionOutcome;
use admin_shell::http::{
    ApiRequest, HttpPipeline, Notifier, Transport, TransportFailure, TransportResponse,
};
use admin_shell::permission::PermissionState;
use admin_shell::session::{Confirmer, Navigator, SessionController};
use admin_shell::views::default_registry;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Barrier;

/// Answers each path with a scripted status and body.
#[derive(Default)]
struct ScriptedTransport {
    answers: Mutex<HashMap<String, (u16, Value)>>,
    seen: Mutex<Vec<ApiRequest>>,
    /// Paths whose next call yields once before answering.
    slow_once: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn answer(&self, path: &str, status: u16, body: Value) {
        self.answers
            .lock()
            .insert(path.to_string(), (status, body));
    }

    fn ok(&self, path: &str, data: Value) {
        self.answer(path, 200, json!({"code": 200, "msg": "OK", "data": data}));
    }

    fn slow_once(&self, path: &str) {
        self.slow_once.lock().push(path.to_string());
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<TransportResponse, TransportFailure> {
        let slow = {
            let mut slow_once = self.slow_once.lock();
            let position = slow_once.iter().position(|p| *p == request.path);
            position.map(|i| slow_once.remove(i)).is_some()
        };
        if slow {
            tokio::task::yield_now().await;
        }

        let answer = self.answers.lock().get(&request.path).cloned();
        self.seen.lock().push(request);
        Ok(match answer {
            Some((status, body)) => TransportResponse::new(status, Some(body)),
            None => TransportResponse::new(404, None),
        })
    }
}

/// Every call waits until `parties` calls are in flight, then answers 401.
struct StormTransport {
    barrier: Barrier,
}

#[async_trait]
impl Transport for StormTransport {
    async fn send(&self, _request: ApiRequest) -> Result<TransportResponse, TransportFailure> {
        self.barrier.wait().await;
        Ok(TransportResponse::new(
            401,
            Some(json!({"code": 401, "msg": "Authentication failed"})),
        ))
    }
}

/// Memory storage counting removals.
#[derive(Default)]
struct CountingStorage {
    inner: MemoryStorage,
    removes: AtomicUsize,
}

impl KeyValueStorage for CountingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }
}

#[derive(Default)]
struct CountingNavigator {
    calls: AtomicUsize,
}

#[async_trait]
impl Navigator for CountingNavigator {
    async fn to_login(&self) -> admin_shell::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct CountingConfirmer {
    prompts: AtomicUsize,
}

#[async_trait]
impl Confirmer for CountingConfirmer {
    async fn confirm_relogin(&self) -> bool {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        true
    }
}

#[derive(Default)]
struct CollectingNotifier {
    messages: Mutex<Vec<String>>,
}

impl Notifier for CollectingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

struct Storm {
    storage: Arc<CountingStorage>,
    navigator: Arc<CountingNavigator>,
    pipeline: HttpPipeline,
}

fn storm(calls: usize, confirmer: Option<Arc<CountingConfirmer>>) -> Storm {
    let storage = Arc::new(CountingStorage::default());
    let credentials = CredentialStore::new(storage.clone());
    credentials.set("expired").unwrap();

    let permission = Arc::new(PermissionState::new(
        Arc::new(default_registry()),
        Vec::new(),
    ));
    let navigator = Arc::new(CountingNavigator::default());
    let mut controller =
        SessionController::new(credentials.clone(), permission, navigator.clone());
    if let Some(confirmer) = confirmer {
        controller = controller.with_confirmation(confirmer);
    }

    let transport = Arc::new(StormTransport {
        barrier: Barrier::new(calls),
    });
    let pipeline = HttpPipeline::new(
        transport,
        credentials,
        Arc::new(CollectingNotifier::default()),
    )
    .with_expiry_handler(Arc::new(controller));

    Storm {
        storage,
        navigator,
        pipeline,
    }
}

#[tokio::test]
async fn test_concurrent_401s_invalidate_once() {
    let storm = storm(5, None);

    let results = futures::future::join_all(
        (0..5).map(|i| storm.pipeline.send(ApiRequest::get(format!("/user/list?page={i}")))),
    )
    .await;

    assert!(results.iter().all(|r| r
        .as_ref()
        .is_err_and(|e| e.is_session_expired())));
    assert_eq!(storm.storage.removes.load(Ordering::SeqCst), 1);
    assert_eq!(storm.navigator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_401s_prompt_once() {
    let confirmer = Arc::new(CountingConfirmer::default());
    let storm = storm(5, Some(confirmer.clone()));

    let results = futures::future::join_all(
        (0..5).map(|_| storm.pipeline.send(ApiRequest::get("/role/list"))),
    )
    .await;

    assert_eq!(results.len(), 5);
    assert_eq!(confirmer.prompts.load(Ordering::SeqCst), 1);
    assert_eq!(storm.storage.removes.load(Ordering::SeqCst), 1);
    assert_eq!(storm.navigator.calls.load(Ordering::SeqCst), 1);
}

fn granted_menus() -> Value {
    json!([{
        "id": 1, "name": "System", "path": "/system", "component": "Layout",
        "icon": "carbon:gui-management", "order": 1, "is_hidden": false,
        "redirect": "/system/user", "keepalive": false, "parent_id": 0,
        "children": [
            {"id": 2, "name": "Users", "path": "user", "component": "/system/user",
             "order": 1, "is_hidden": false, "parent_id": 1},
            {"id": 3, "name": "Roles", "path": "role", "component": "/system/role",
             "order": 2, "is_hidden": false, "parent_id": 1}
        ]
    }, {
        "id": 9, "name": "Audit", "path": "/auditlog", "component": "/system/auditlog",
        "order": 5, "is_hidden": false, "children": null
    }])
}

fn scripted_backend() -> Arc<ScriptedTransport> {
    let transport = Arc::new(ScriptedTransport::default());
    transport.ok(
        "/base/access_token",
        json!({"access_token": "jwt-token", "username": "admin"}),
    );
    transport.ok(
        "/base/userinfo",
        json!({"id": 1, "username": "admin", "email": "admin@admin.com",
               "roles": [], "is_superuser": false, "is_active": true}),
    );
    transport.ok("/base/usermenu", granted_menus());
    transport.ok(
        "/base/userapi",
        json!(["get/api/v1/user/list", "post/api/v1/user/create"]),
    );
    transport
}

fn shell(transport: Arc<ScriptedTransport>) -> AppShell {
    let config = ShellConfig {
        app_title: "Admin".to_string(),
        ..Default::default()
    };
    AppShell::builder(config)
        .with_transport(transport)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_login_continues_to_requested_page() {
    let transport = scripted_backend();
    let shell = shell(transport.clone());

    shell.navigate("/system/user").await.unwrap();
    let current = shell.current().unwrap();
    assert_eq!(current.path, "/login");
    assert_eq!(current.query_value("redirect"), Some("/system/user"));
    assert!(shell.tags().tags().is_empty());

    let outcome = shell.login("admin", "123456").await.unwrap();

    assert!(outcome.is_committed());
    assert_eq!(shell.current().unwrap().to_string(), "/system/user");
    assert_eq!(shell.title(), "Users | Admin");
    assert!(!shell.is_loading());
    assert_eq!(shell.user().unwrap().username, "admin");

    let menus: Vec<_> = shell.menus().into_iter().filter_map(|m| m.name).collect();
    assert_eq!(menus, vec!["Home", "System", "Audit"]);

    assert!(shell.has_permission("get/api/v1/user/list").unwrap());
    assert!(!shell.has_permission("delete/api/v1/user/delete").unwrap());

    let tags: Vec<_> = shell.tags().tags().into_iter().map(|t| t.path).collect();
    assert_eq!(tags, vec!["/system/user"]);

    let seen = transport.seen.lock();
    let login = seen.iter().find(|r| r.path == "/base/access_token").unwrap();
    assert!(login.headers.get("token").is_none());
    let menu = seen.iter().find(|r| r.path == "/base/usermenu").unwrap();
    assert_eq!(menu.headers.get("token").unwrap(), "jwt-token");
}

#[tokio::test]
async fn test_granted_routes_resolve_after_login() {
    let shell = shell(scripted_backend());
    shell.login("admin", "123456").await.unwrap();
    assert_eq!(shell.current().unwrap().path, "/workbench");

    shell.navigate("/system").await.unwrap();
    assert_eq!(shell.current().unwrap().path, "/system/user");

    let outcome = shell.navigate("/auditlog").await.unwrap();
    let TransitionOutcome::Committed(route) = outcome else {
        panic!("expected commit");
    };
    assert_eq!(route.name.as_deref(), Some("AuditDefault"));
    assert_eq!(shell.title(), "Audit | Admin");

    shell.navigate("/login").await.unwrap();
    assert_eq!(shell.current().unwrap().path, "/workbench");
}

#[tokio::test]
async fn test_expired_session_returns_to_login() {
    let transport = scripted_backend();
    let shell = shell(transport.clone());
    shell.login("admin", "123456").await.unwrap();
    shell.navigate("/system/role").await.unwrap();

    transport.answer(
        "/base/update_password",
        401,
        json!({"code": 401, "msg": "Authentication failed"}),
    );
    let err = shell
        .api()
        .update_password(&UpdatePasswordRequest {
            old_password: "123456".to_string(),
            new_password: "654321".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, admin_shell::Error::Api(ref api) if api.is_session_expired()));

    assert!(!shell.credentials().is_present());
    assert!(shell.user().is_none());
    assert!(shell.tags().tags().is_empty());
    assert!(shell.permission().granted_routes().is_empty());
    assert!(shell.permission().apis().is_empty());

    let current = shell.current().unwrap();
    assert_eq!(current.path, "/login");
    assert_eq!(current.query_value("redirect"), Some("/system/role"));
}

#[tokio::test]
async fn test_bootstrap_with_unknown_view_signs_out() {
    let transport = scripted_backend();
    transport.ok(
        "/base/usermenu",
        json!([{"name": "Certificates", "path": "/certs", "component": "/certs/issued"}]),
    );
    let shell = shell(transport);
    shell.credentials().set("jwt-token").unwrap();

    let err = shell.bootstrap().await.unwrap_err();

    assert!(err.is_configuration_fault());
    assert!(!shell.credentials().is_present());
    assert_eq!(shell.current().unwrap().path, "/login");
}

#[tokio::test]
async fn test_overlapping_bootstraps_keep_session() {
    let transport = scripted_backend();
    transport.slow_once("/base/usermenu");
    let shell = shell(transport);
    shell.credentials().set("jwt-token").unwrap();

    let (first, second) = tokio::join!(shell.bootstrap(), shell.bootstrap());

    assert!(first.is_ok(), "first bootstrap: {first:?}");
    assert!(second.is_ok(), "second bootstrap: {second:?}");
    assert!(shell.credentials().is_present());
    assert_eq!(shell.user().unwrap().username, "admin");
    assert_eq!(shell.permission().granted_routes().len(), 2);
    assert!(shell.has_permission("get/api/v1/user/list").unwrap());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let shell = shell(scripted_backend());
    shell.login("admin", "123456").await.unwrap();

    shell.logout().await.unwrap();

    assert!(!shell.credentials().is_present());
    assert!(shell.user().is_none());
    assert_eq!(shell.menus().len(), 1);

    shell.navigate("/dashboard").await.unwrap();
    let current = shell.current().unwrap();
    assert_eq!(current.path, "/login");
    assert_eq!(current.query_value("redirect"), Some("/dashboard"));
}
