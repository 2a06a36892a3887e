//! Server-supplied menu graph.

use serde::{Deserialize, Deserializer, Serialize};

/// A unit of navigation granted by the server, potentially nested.
///
/// Field names follow the server's wire format. Unknown fields such as `id`,
/// `parent_id` or `menu_type` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuNode {
    pub name: String,
    pub path: String,
    /// Component path of the view rendered for this node, e.g. `/system/user`.
    #[serde(rename = "component", default)]
    pub component_ref: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub keepalive: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    /// Create a leaf node.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        component_ref: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            component_ref: component_ref.into(),
            ..Default::default()
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    pub fn keep_alive(mut self) -> Self {
        self.keepalive = true;
        self
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<MenuNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<MenuNode>>::deserialize(deserializer)?.unwrap_or_default())
}
