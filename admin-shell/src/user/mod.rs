//! Signed-in user profile.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::session::SessionReset;

/// Profile returned by the user info endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Role records as the server sends them.
    #[serde(default)]
    pub roles: Vec<Value>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default)]
pub struct UserStore {
    info: RwLock<Option<UserInfo>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, info: UserInfo) {
        debug!(user_id = info.id, username = %info.username, "User profile loaded");
        *self.info.write() = Some(info);
    }

    pub fn get(&self) -> Option<UserInfo> {
        self.info.read().clone()
    }

    pub fn username(&self) -> Option<String> {
        self.info.read().as_ref().map(|i| i.username.clone())
    }

    pub fn is_superuser(&self) -> bool {
        self.info.read().as_ref().is_some_and(|i| i.is_superuser)
    }

    pub fn is_signed_in(&self) -> bool {
        self.info.read().is_some()
    }
}

impl SessionReset for UserStore {
    fn name(&self) -> &str {
        "user"
    }

    fn reset_session(&self) {
        self.info.write().take();
    }
}
