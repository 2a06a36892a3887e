use std::collections::BTreeSet;

use reqwest::Method;

/// Identifier the server uses for an endpoint: lower-case method followed
/// by the path, e.g. `get/api/v1/user/list`.
pub fn api_identifier(method: &Method, path: &str) -> String {
    format!("{}{}", method.as_str().to_ascii_lowercase(), path)
}

/// API identifiers the current user may invoke.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedApiSet {
    apis: BTreeSet<String>,
}

impl AllowedApiSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, api: &str) -> bool {
        self.apis.contains(api)
    }

    pub fn len(&self) -> usize {
        self.apis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apis.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.apis.iter().map(String::as_str)
    }
}

impl FromIterator<String> for AllowedApiSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            apis: iter.into_iter().collect(),
        }
    }
}
