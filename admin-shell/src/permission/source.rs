use async_trait::async_trait;
use route_tree::MenuNode;

use crate::http::ApiError;

/// Server endpoints the permission state is populated from.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Menu graph granted to the current credential.
    async fn fetch_menus(&self) -> Result<Vec<MenuNode>, ApiError>;

    /// API identifiers granted to the current credential.
    async fn fetch_apis(&self) -> Result<Vec<String>, ApiError>;
}
