//! Logging setup with a reloadable filter.
//!
//! This module provides:
//! - Runtime log level changes via `tracing_subscriber::reload`
//! - Local timezone timestamps
//! - Optional JSON output for log shippers

use chrono::Local;
use tracing::info;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    reload::{self, Handle},
    util::SubscriberInitExt,
};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "admin_shell=info,route_tree=info";

/// Timestamps in the local timezone.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

pub type FilterHandle = Handle<EnvFilter, tracing_subscriber::Registry>;

/// Handle to the installed subscriber's filter.
pub struct LoggingHandle {
    handle: FilterHandle,
}

impl LoggingHandle {
    /// Current filter directive.
    pub fn get_filter(&self) -> String {
        self.handle
            .with_current(|filter| filter.to_string())
            .unwrap_or_default()
    }

    /// Replace the filter directive, e.g. `admin_shell=debug`.
    pub fn set_filter(&self, directive: &str) -> crate::Result<()> {
        let new_filter = parse_filter(directive)?;

        self.handle
            .reload(new_filter)
            .map_err(|e| crate::Error::Other(format!("Failed to reload filter: {e}")))?;

        info!(directive = %directive, "Log filter updated");
        Ok(())
    }
}

fn parse_filter(directive: &str) -> crate::Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| crate::Error::config(format!("Invalid filter directive '{directive}': {e}")))
}

/// Pick the initial filter: an explicit directive, then `RUST_LOG`, then the
/// default.
fn initial_filter(directive: Option<&str>) -> crate::Result<EnvFilter> {
    match directive.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directive) => parse_filter(directive),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
    }
}

/// Install the global subscriber.
///
/// Fails when `directive` is invalid or a subscriber is already installed.
pub fn init_logging(directive: Option<&str>, json: bool) -> crate::Result<LoggingHandle> {
    let (filter_layer, handle) = reload::Layer::new(initial_filter(directive)?);

    let text_layer = (!json).then(|| fmt::layer().with_ansi(true).with_timer(LocalTimer));
    let json_layer = json.then(|| fmt::layer().json().with_timer(LocalTimer));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| crate::Error::Other(format!("Failed to set global default subscriber: {e}")))?;

    Ok(LoggingHandle { handle })
}
