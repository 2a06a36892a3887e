//! Normalized call errors.
//!
//! Nothing above the pipeline inspects raw transport objects: application
//! errors, transport failures and session expiry all surface as [`ApiError`].

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Classification of failures where no response was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Other,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::Connect => "CONNECT",
            Self::Request => "REQUEST",
            Self::Body => "BODY",
            Self::Other => "NETWORK",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code carried by a normalized error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Application envelope code, or the transport status when the body
    /// carries none.
    Status(i64),
    /// No response was received.
    Transport(TransportErrorKind),
    /// The envelope arrived but `data` did not have the expected shape.
    Decode,
}

impl ErrorCode {
    pub fn status(&self) -> Option<i64> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "{code}"),
            Self::Transport(kind) => write!(f, "{kind}"),
            Self::Decode => f.write_str("DECODE"),
        }
    }
}

/// Normalized rejection of a server call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{code}] {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    /// Human-readable message for transient notices.
    pub message: String,
    /// The original payload, for callers that need more than the message.
    pub error: Value,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>, error: Value) -> Self {
        Self {
            code,
            message: message.into(),
            error,
        }
    }

    /// Whether the server declared the session expired.
    pub fn is_session_expired(&self) -> bool {
        self.code == ErrorCode::Status(super::SESSION_EXPIRED_CODE)
    }
}

fn table_message(code: &ErrorCode) -> Option<&'static str> {
    match code {
        ErrorCode::Status(400) => Some("Invalid request parameters"),
        ErrorCode::Status(401) => Some("Sign-in has expired, please sign in again"),
        ErrorCode::Status(403) => Some("Permission denied"),
        ErrorCode::Status(404) => Some("Resource or endpoint not found"),
        ErrorCode::Status(500) => Some("Internal server error"),
        ErrorCode::Status(502) | ErrorCode::Status(503) | ErrorCode::Status(504) => {
            Some("Service temporarily unavailable")
        }
        ErrorCode::Status(_) => None,
        ErrorCode::Transport(TransportErrorKind::Timeout) => Some("Request timed out"),
        ErrorCode::Transport(TransportErrorKind::Connect) => Some("Unable to reach the server"),
        ErrorCode::Transport(_) => Some("Network error"),
        ErrorCode::Decode => Some("Unexpected response format"),
    }
}

/// Resolve the user-facing message for a failed call.
///
/// Precedence: the server's own `msg`, the code table, the transport status
/// text, and finally a generic message naming the code.
pub fn resolve_message(code: &ErrorCode, server_msg: Option<&str>, status_text: Option<&str>) -> String {
    let non_blank = |s: &&str| !s.trim().is_empty();

    if let Some(msg) = server_msg.filter(non_blank) {
        return msg.to_string();
    }
    if let Some(msg) = table_message(code) {
        return msg.to_string();
    }
    if let Some(text) = status_text.filter(non_blank) {
        return text.to_string();
    }
    format!("[{code}]: unknown error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_wins() {
        let msg = resolve_message(&ErrorCode::Status(403), Some("forbidden"), Some("Forbidden"));
        assert_eq!(msg, "forbidden");
    }

    #[test]
    fn test_table_before_status_text() {
        let msg = resolve_message(&ErrorCode::Status(403), None, Some("Forbidden"));
        assert_eq!(msg, "Permission denied");

        let msg = resolve_message(&ErrorCode::Status(403), Some("  "), None);
        assert_eq!(msg, "Permission denied");
    }

    #[test]
    fn test_status_text_then_generic() {
        let msg = resolve_message(&ErrorCode::Status(418), None, Some("I'm a teapot"));
        assert_eq!(msg, "I'm a teapot");

        let msg = resolve_message(&ErrorCode::Status(418), None, None);
        assert_eq!(msg, "[418]: unknown error");
    }

    #[test]
    fn test_transport_codes() {
        let msg = resolve_message(
            &ErrorCode::Transport(TransportErrorKind::Timeout),
            Some("operation timed out"),
            None,
        );
        assert_eq!(msg, "operation timed out");

        let msg = resolve_message(&ErrorCode::Transport(TransportErrorKind::Connect), None, None);
        assert_eq!(msg, "Unable to reach the server");
    }

    #[test]
    fn test_session_expired_flag() {
        let err = ApiError::new(ErrorCode::Status(401), "expired", Value::Null);
        assert!(err.is_session_expired());
        assert_eq!(err.to_string(), "[401] expired");
    }
}
