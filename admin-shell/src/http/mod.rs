//! HTTP call pipeline.
//!
//! Every server call goes through [`HttpPipeline`]:
//!
//! 1. Request stage: the stored credential is attached unless the request is
//!    credential-exempt or the caller already set the header.
//! 2. Response stage: the application envelope `{code, msg, data}` is
//!    checked; anything but the ok code becomes a normalized [`ApiError`].
//! 3. Failure stage: transport failures and non-ok statuses normalize to the
//!    same [`ApiError`] shape. A 401 first hands over to the session
//!    controller, which reacts once per expiry storm.

mod error;
mod notifier;
mod pipeline;
mod request;
mod response;
mod transport;

pub use error::{ApiError, ErrorCode, TransportErrorKind, resolve_message};
pub use notifier::{Notifier, TracingNotifier};
pub use pipeline::{HttpPipeline, PipelineOptions};
pub use request::ApiRequest;
pub use response::{ApiEnvelope, TransportResponse};
pub use transport::{ReqwestTransport, Transport, TransportFailure, install_rustls_provider};

/// Application code of a successful call.
pub const OK_CODE: i64 = 200;

/// Application or transport code signalling an expired session.
pub const SESSION_EXPIRED_CODE: i64 = 401;
