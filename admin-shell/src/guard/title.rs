use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Guard, Transition, TransitionOutcome};

/// Where the window title goes.
pub trait TitleSink: Send + Sync {
    fn set_title(&self, title: &str);
}

/// Headless title holder.
#[derive(Debug, Default)]
pub struct DocumentTitle {
    title: RwLock<String>,
}

impl DocumentTitle {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            title: RwLock::new(initial.into()),
        }
    }

    pub fn get(&self) -> String {
        self.title.read().clone()
    }
}

impl TitleSink for DocumentTitle {
    fn set_title(&self, title: &str) {
        *self.title.write() = title.to_string();
    }
}

pub fn format_title(route_title: &str, app_title: &str) -> String {
    if route_title.trim().is_empty() {
        app_title.to_string()
    } else {
        format!("{route_title} | {app_title}")
    }
}

/// Sets the window title once a transition commits.
pub struct TitleGuard {
    sink: Arc<dyn TitleSink>,
    app_title: String,
}

impl TitleGuard {
    pub fn new(sink: Arc<dyn TitleSink>, app_title: impl Into<String>) -> Self {
        Self {
            sink,
            app_title: app_title.into(),
        }
    }
}

#[async_trait]
impl Guard for TitleGuard {
    fn name(&self) -> &'static str {
        "title"
    }

    async fn after_each(&self, _transition: &Transition, outcome: &TransitionOutcome) {
        if let TransitionOutcome::Committed(route) = outcome {
            self.sink
                .set_title(&format_title(&route.meta.title, &self.app_title));
        }
    }
}
