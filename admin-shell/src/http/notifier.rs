use tracing::warn;

/// Surface for transient user-facing notices.
pub trait Notifier: Send + Sync {
    /// Show an error notice.
    fn error(&self, message: &str);
}

/// Notifier for headless use: notices go to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        warn!(target: "admin_shell::notice", "{}", message);
    }
}
