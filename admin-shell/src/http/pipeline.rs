//! Request/response interceptor chain around a [`Transport`].

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::error::{ApiError, ErrorCode, resolve_message};
use super::notifier::Notifier;
use super::request::ApiRequest;
use super::response::{ApiEnvelope, TransportResponse};
use super::transport::{Transport, TransportFailure};
use super::{OK_CODE, SESSION_EXPIRED_CODE};
use crate::credentials::CredentialStore;
use crate::session::ExpiryHandler;

/// Tunables of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Header the credential is sent in.
    pub credential_header: HeaderName,
    pub ok_code: i64,
    pub expired_code: i64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            credential_header: HeaderName::from_static("token"),
            ok_code: OK_CODE,
            expired_code: SESSION_EXPIRED_CODE,
        }
    }
}

/// Runs every server call through credential injection and error
/// normalization.
pub struct HttpPipeline {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    notifier: Arc<dyn Notifier>,
    expiry: Option<Arc<dyn ExpiryHandler>>,
    options: PipelineOptions,
}

impl HttpPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            credentials,
            notifier,
            expiry: None,
            options: PipelineOptions::default(),
        }
    }

    /// Hand 401 responses to `handler` before rejecting them.
    pub fn with_expiry_handler(mut self, handler: Arc<dyn ExpiryHandler>) -> Self {
        self.expiry = Some(handler);
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Send a request and return the ok envelope.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiEnvelope, ApiError> {
        let credential = self.attach_credential(&mut request);

        match self.transport.send(request).await {
            Ok(response) => self.on_response(response, credential).await,
            Err(failure) => Err(self.on_transport_failure(failure)),
        }
    }

    /// Send a request and decode the envelope's `data`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request)
            .await?
            .into_data()
            .map_err(|e| self.reject(e))
    }

    /// Request stage. Returns the credential the request goes out with.
    fn attach_credential(&self, request: &mut ApiRequest) -> Option<String> {
        let header = &self.options.credential_header;

        if !request.skip_credential
            && !request.headers.contains_key(header)
            && let Some(token) = self.credentials.get()
        {
            match HeaderValue::from_str(&token) {
                Ok(value) => {
                    request.headers.insert(header.clone(), value);
                }
                Err(e) => warn!(error = %e, "Stored credential is not a valid header value"),
            }
        }

        request
            .headers
            .get(header)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    async fn on_response(
        &self,
        response: TransportResponse,
        credential: Option<String>,
    ) -> Result<ApiEnvelope, ApiError> {
        let code = response.effective_code();

        if response.is_success() && code == self.options.ok_code {
            let body = response.body.unwrap_or_default();
            return serde_json::from_value::<ApiEnvelope>(body.clone()).map_err(|e| {
                let code = ErrorCode::Decode;
                let message = resolve_message(&code, None, None);
                debug!(error = %e, "Response is not an application envelope");
                self.reject(ApiError::new(code, message, body))
            });
        }

        if code == self.options.expired_code
            && let Some(handler) = &self.expiry
        {
            let reaction = handler.handle_expiry(credential.as_deref()).await;
            debug!(?reaction, "Session expiry handled");
        }

        let error_code = ErrorCode::Status(code);
        let message = resolve_message(
            &error_code,
            response.envelope_msg(),
            Some(response.status_text.as_str()),
        );
        let payload = match response.body {
            Some(body) => body,
            None => json!({
                "status": response.status,
                "statusText": response.status_text,
            }),
        };

        Err(self.reject(ApiError::new(error_code, message, payload)))
    }

    fn on_transport_failure(&self, failure: TransportFailure) -> ApiError {
        let code = ErrorCode::Transport(failure.kind);
        let message = resolve_message(&code, Some(failure.message.as_str()), None);
        let payload = json!({
            "kind": failure.kind.as_str(),
            "message": failure.message,
        });
        self.reject(ApiError::new(code, message, payload))
    }

    fn reject(&self, error: ApiError) -> ApiError {
        warn!(code = %error.code, message = %error.message, "Request rejected");
        self.notifier.error(&error.message);
        error
    }
}
