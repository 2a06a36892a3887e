//! Shell configuration.
//!
//! Values come from the process environment (after loading a `.env` file
//! when one exists), falling back to defaults.
//!
//! Supported env vars:
//! - `ADMIN_SHELL_ENV`: `dev`, `test` or `prod`
//! - `ADMIN_SHELL_USE_PROXY`: call the dev-server proxy prefix instead of the
//!   backend directly
//! - `ADMIN_SHELL_ORIGIN`: origin serving the proxy, required with the proxy
//! - `ADMIN_SHELL_TIMEOUT_MS`: request timeout, default 12000
//! - `ADMIN_SHELL_STORAGE`: JSON file holding the credential; in-memory when unset
//! - `ADMIN_SHELL_EXPIRY_POLICY`: `immediate` or `confirm`
//! - `ADMIN_SHELL_TOKEN_HEADER`: header carrying the credential, default `token`
//! - `ADMIN_SHELL_APP_TITLE`
//! - `ADMIN_SHELL_LOG`: log filter directive
//! - `ADMIN_SHELL_LOG_JSON`: JSON log output

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::HeaderName;
use tracing::debug;

use crate::http::PipelineOptions;
use crate::session::ExpiryPolicy;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(12_000);
pub const DEFAULT_TOKEN_HEADER: &str = "token";
pub const DEFAULT_APP_TITLE: &str = "Vue FastAPI Admin";

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Dev,
    Test,
    Prod,
}

/// Where calls go: through the dev-server proxy prefix, or to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyTarget {
    pub prefix: &'static str,
    pub target: &'static str,
}

impl Environment {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }

    pub const fn proxy_target(&self) -> ProxyTarget {
        match self {
            Self::Dev => ProxyTarget {
                prefix: "/url-patten",
                target: "http://127.0.0.1:9999/api/v1",
            },
            Self::Test | Self::Prod => ProxyTarget {
                prefix: "/url-patten",
                target: "http://127.0.0.1:9999",
            },
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            "prod" | "production" => Ok(Self::Prod),
            other => Err(Error::config(format!(
                "unknown environment '{other}', expected dev, test or prod"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShellConfig {
    pub environment: Environment,
    pub use_proxy: bool,
    pub origin: Option<String>,
    pub timeout: Duration,
    pub storage_path: Option<PathBuf>,
    pub expiry_policy: ExpiryPolicy,
    pub token_header: String,
    pub app_title: String,
    pub log_filter: Option<String>,
    pub log_json: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Dev,
            use_proxy: false,
            origin: None,
            timeout: DEFAULT_TIMEOUT,
            storage_path: None,
            expiry_policy: ExpiryPolicy::Immediate,
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            log_filter: None,
            log_json: false,
        }
    }
}

impl ShellConfig {
    /// Load from the environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(env) = var("ADMIN_SHELL_ENV") {
            config.environment = env.parse()?;
        }
        if let Some(flag) = var("ADMIN_SHELL_USE_PROXY") {
            config.use_proxy = parse_bool("ADMIN_SHELL_USE_PROXY", &flag)?;
        }
        config.origin = var("ADMIN_SHELL_ORIGIN");
        if let Some(ms) = var("ADMIN_SHELL_TIMEOUT_MS") {
            let ms = ms.trim().parse::<u64>().map_err(|e| {
                Error::config(format!("ADMIN_SHELL_TIMEOUT_MS must be milliseconds: {e}"))
            })?;
            config.timeout = Duration::from_millis(ms);
        }
        config.storage_path = var("ADMIN_SHELL_STORAGE").map(PathBuf::from);
        if let Some(policy) = var("ADMIN_SHELL_EXPIRY_POLICY") {
            config.expiry_policy = policy.parse()?;
        }
        if let Some(header) = var("ADMIN_SHELL_TOKEN_HEADER") {
            config.token_header = header.trim().to_string();
        }
        if let Some(title) = var("ADMIN_SHELL_APP_TITLE") {
            config.app_title = title;
        }
        config.log_filter = var("ADMIN_SHELL_LOG");
        if let Some(flag) = var("ADMIN_SHELL_LOG_JSON") {
            config.log_json = parse_bool("ADMIN_SHELL_LOG_JSON", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        self.pipeline_options()?;
        Ok(())
    }

    /// Base URL every request path is appended to.
    pub fn base_url(&self) -> Result<String> {
        let proxy = self.environment.proxy_target();
        if !self.use_proxy {
            return Ok(proxy.target.to_string());
        }
        let origin = self.origin.as_deref().ok_or_else(|| {
            Error::config("ADMIN_SHELL_ORIGIN is required when ADMIN_SHELL_USE_PROXY is set")
        })?;
        Ok(format!("{}{}", origin.trim_end_matches('/'), proxy.prefix))
    }

    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        let credential_header = HeaderName::from_str(&self.token_header).map_err(|e| {
            Error::config(format!("invalid token header '{}': {e}", self.token_header))
        })?;
        Ok(PipelineOptions {
            credential_header,
            ..PipelineOptions::default()
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(format!("{key} must be a boolean, got '{other}'"))),
    }
}
