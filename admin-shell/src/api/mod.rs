//! Typed server endpoints.
//!
//! [`ApiClient`] is a thin layer over [`HttpPipeline`]: each method builds
//! one request and decodes the envelope's `data`. Login and forgot-password
//! calls carry no credential.

mod models;

use std::sync::Arc;

use async_trait::async_trait;
use route_tree::MenuNode;
use tracing::instrument;

pub use models::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, ResetPasswordRequest,
    UpdatePasswordRequest,
};

use crate::Result;
use crate::http::{ApiError, ApiRequest, HttpPipeline};
use crate::permission::PermissionSource;
use crate::user::UserInfo;

pub const LOGIN_PATH: &str = "/base/access_token";
pub const FORGOT_PASSWORD_PATH: &str = "/base/forgot_password";
pub const RESET_PASSWORD_PATH: &str = "/base/rest_password";
pub const USER_INFO_PATH: &str = "/base/userinfo";
pub const USER_MENU_PATH: &str = "/base/usermenu";
pub const USER_API_PATH: &str = "/base/userapi";
pub const UPDATE_PASSWORD_PATH: &str = "/base/update_password";

#[derive(Clone)]
pub struct ApiClient {
    pipeline: Arc<HttpPipeline>,
}

impl ApiClient {
    pub fn new(pipeline: Arc<HttpPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &HttpPipeline {
        &self.pipeline
    }

    /// Exchange username and password for an access token.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let request = ApiRequest::post(LOGIN_PATH)
            .with_json(request)?
            .without_credential();
        Ok(self.pipeline.fetch(request).await?)
    }

    pub async fn user_info(&self) -> std::result::Result<UserInfo, ApiError> {
        self.pipeline.fetch(ApiRequest::get(USER_INFO_PATH)).await
    }

    /// Menu graph granted to the signed-in user.
    pub async fn user_menu(&self) -> std::result::Result<Vec<MenuNode>, ApiError> {
        self.pipeline.fetch(ApiRequest::get(USER_MENU_PATH)).await
    }

    /// API identifiers granted to the signed-in user.
    pub async fn user_api(&self) -> std::result::Result<Vec<String>, ApiError> {
        self.pipeline.fetch(ApiRequest::get(USER_API_PATH)).await
    }

    /// Returns the server's confirmation message.
    pub async fn update_password(&self, request: &UpdatePasswordRequest) -> Result<Option<String>> {
        let request = ApiRequest::post(UPDATE_PASSWORD_PATH).with_json(request)?;
        Ok(self.pipeline.send(request).await?.msg)
    }

    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<Option<String>> {
        let request = ApiRequest::post(FORGOT_PASSWORD_PATH)
            .with_json(request)?
            .without_credential();
        Ok(self.pipeline.send(request).await?.msg)
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Option<String>> {
        let request = ApiRequest::post(RESET_PASSWORD_PATH).with_json(request)?;
        Ok(self.pipeline.send(request).await?.msg)
    }
}

#[async_trait]
impl PermissionSource for ApiClient {
    async fn fetch_menus(&self) -> std::result::Result<Vec<MenuNode>, ApiError> {
        self.user_menu().await
    }

    async fn fetch_apis(&self) -> std::result::Result<Vec<String>, ApiError> {
        self.user_api().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::credentials::{CredentialStore, MemoryStorage};
    use crate::http::{
        ErrorCode, TracingNotifier, Transport, TransportFailure, TransportResponse,
    };
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::collections::HashMap;

    /// Answers by path and records what it was asked.
    #[derive(Default)]
    struct PathTransport {
        answers: HashMap<&'static str, Value>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl Transport for PathTransport {
        async fn send(
            &self,
            request: ApiRequest,
        ) -> std::result::Result<TransportResponse, TransportFailure> {
            let body = self.answers.get(request.path.as_str()).cloned();
            self.seen.lock().push(request);
            Ok(match body {
                Some(body) => TransportResponse::new(200, Some(body)),
                None => TransportResponse::new(404, None),
            })
        }
    }

    fn client(answers: HashMap<&'static str, Value>) -> (Arc<PathTransport>, ApiClient) {
        let transport = Arc::new(PathTransport {
            answers,
            ..Default::default()
        });
        let credentials = CredentialStore::new(Arc::new(MemoryStorage::new()));
        credentials.set("abc").unwrap();
        let pipeline = HttpPipeline::new(transport.clone(), credentials, Arc::new(TracingNotifier));
        (transport, ApiClient::new(Arc::new(pipeline)))
    }

    #[tokio::test]
    async fn test_login_is_credential_exempt() {
        let (transport, client) = client(HashMap::from([(
            LOGIN_PATH,
            json!({"code": 200, "msg": "OK", "data": {"access_token": "jwt", "username": "admin"}}),
        )]));

        let response = client
            .login(&LoginRequest::new("admin", "123456"))
            .await
            .unwrap();

        assert_eq!(response.access_token, "jwt");
        let seen = transport.seen.lock();
        assert!(seen[0].skip_credential);
        assert!(seen[0].headers.get("token").is_none());
        assert_eq!(seen[0].body.as_ref().unwrap()["password"], "123456");
    }

    #[tokio::test]
    async fn test_permission_source_endpoints() {
        let (transport, client) = client(HashMap::from([
            (
                USER_MENU_PATH,
                json!({"code": 200, "data": [{
                    "id": 1, "name": "System", "path": "/system", "component": "Layout",
                    "icon": "carbon:gui-management", "order": 1, "is_hidden": false,
                    "redirect": "", "keepalive": true, "parent_id": 0,
                    "children": [{"name": "Users", "path": "user", "component": "/system/user",
                                  "order": 1, "is_hidden": false, "children": null}]
                }]}),
            ),
            (USER_API_PATH, json!({"code": 200, "data": ["get/api/v1/user/list"]})),
        ]));

        let menus = client.fetch_menus().await.unwrap();
        assert_eq!(menus[0].children[0].component_ref, "/system/user");
        assert_eq!(menus[0].redirect, None);

        let apis = client.fetch_apis().await.unwrap();
        assert_eq!(apis, vec!["get/api/v1/user/list"]);

        let seen = transport.seen.lock();
        assert!(seen.iter().all(|r| r.headers.get("token").is_some()));
    }

    #[tokio::test]
    async fn test_update_password_failure_message() {
        let (_, client) = client(HashMap::from([(
            UPDATE_PASSWORD_PATH,
            json!({"code": 400, "msg": "Old password is incorrect"}),
        )]));

        let err = client
            .update_password(&UpdatePasswordRequest {
                old_password: "wrong".to_string(),
                new_password: "secret".to_string(),
            })
            .await
            .unwrap_err();

        let Error::Api(api) = err else {
            panic!("expected api error");
        };
        assert_eq!(api.code, ErrorCode::Status(400));
        assert_eq!(api.message, "Old password is incorrect");
    }

    #[tokio::test]
    async fn test_password_recovery_credentials() {
        let ok = json!({"code": 200, "msg": "Mail sent"});
        let (transport, client) = client(HashMap::from([
            (FORGOT_PASSWORD_PATH, ok.clone()),
            (RESET_PASSWORD_PATH, ok),
        ]));

        let msg = client
            .forgot_password(&ForgotPasswordRequest {
                email: "admin@admin.com".to_string(),
                language: "en".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(msg.as_deref(), Some("Mail sent"));
        client
            .reset_password(&ResetPasswordRequest {
                reset_token: "reset-token".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        let seen = transport.seen.lock();
        assert_eq!(seen[0].path, FORGOT_PASSWORD_PATH);
        assert!(seen[0].headers.get("token").is_none());
        assert_eq!(seen[1].path, RESET_PASSWORD_PATH);
        assert_eq!(seen[1].headers.get("token").unwrap(), "abc");
        assert_eq!(seen[1].body.as_ref().unwrap()["reset_token"], "reset-token");
    }
}
