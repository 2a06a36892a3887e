use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, ErrorCode, resolve_message};

/// What the transport hands back when a response was received.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON body, `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            body,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Application code from the body, if the body carries one.
    pub fn envelope_code(&self) -> Option<i64> {
        self.body.as_ref()?.get("code")?.as_i64()
    }

    /// Server message from the body, if any.
    pub fn envelope_msg(&self) -> Option<&str> {
        self.body.as_ref()?.get("msg")?.as_str()
    }

    /// Application code, falling back to the transport status.
    pub fn effective_code(&self) -> i64 {
        self.envelope_code().unwrap_or(i64::from(self.status))
    }
}

/// Application envelope every endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Value,
    /// Paging fields (`total`, `page`, `page_size`) and anything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiEnvelope {
    /// Decode `data` into a typed value.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            let code = ErrorCode::Decode;
            ApiError::new(code, resolve_message(&code, None, None), self.data)
                .with_detail(e.to_string())
        })
    }

    /// Total count for paged list endpoints.
    pub fn total(&self) -> Option<u64> {
        self.extra.get("total").and_then(Value::as_u64)
    }
}

impl ApiError {
    fn with_detail(mut self, detail: String) -> Self {
        self.message = format!("{}: {}", self.message, detail);
        self
    }
}
