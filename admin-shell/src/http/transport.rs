//! Transport abstraction and the reqwest-backed implementation.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

use super::error::TransportErrorKind;
use super::request::ApiRequest;
use super::response::TransportResponse;
use crate::{Error, Result};

/// A call that produced no response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportFailure {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_request() || e.is_builder() {
            TransportErrorKind::Request
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, e.to_string())
    }
}

/// Generic HTTP client the pipeline wraps.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request. Any received response is `Ok`, whatever its status.
    async fn send(&self, request: ApiRequest) -> std::result::Result<TransportResponse, TransportFailure>;
}

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another component installed a provider first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Transport over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport rooted at `base_url` with a default timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        install_rustls_provider();

        Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid base URL '{base_url}': {e}")))?;

        let mut builder = Client::builder();
        if timeout > Duration::ZERO {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest) -> std::result::Result<Url, TransportFailure> {
        // Plain concatenation: `Url::join` would drop the base path for
        // absolute request paths.
        let path = if request.path.starts_with('/') {
            request.path.clone()
        } else {
            format!("/{}", request.path)
        };

        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            TransportFailure::new(TransportErrorKind::Request, format!("invalid URL: {e}"))
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> std::result::Result<TransportResponse, TransportFailure> {
        let url = self.url_for(&request)?;
        trace!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
