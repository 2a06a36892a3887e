use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Guard, GuardDecision, Transition, TransitionOutcome};
use crate::Result;

/// Progress indicator shown while a transition is pending.
pub trait LoadingIndicator: Send + Sync {
    fn start(&self);
    fn finish(&self);
}

/// Headless indicator counting pending transitions.
#[derive(Debug, Default)]
pub struct LoadingState {
    pending: AtomicUsize,
}

impl LoadingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.load(Ordering::Acquire) > 0
    }
}

impl LoadingIndicator for LoadingState {
    fn start(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    fn finish(&self) {
        // Saturating: a stray finish must not wrap.
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

pub struct LoadingGuard {
    indicator: Arc<dyn LoadingIndicator>,
}

impl LoadingGuard {
    pub fn new(indicator: Arc<dyn LoadingIndicator>) -> Self {
        Self { indicator }
    }
}

#[async_trait]
impl Guard for LoadingGuard {
    fn name(&self) -> &'static str {
        "loading"
    }

    async fn before_each(&self, _transition: &Transition) -> Result<GuardDecision> {
        self.indicator.start();
        Ok(GuardDecision::Allow)
    }

    async fn after_each(&self, _transition: &Transition, _outcome: &TransitionOutcome) {
        self.indicator.finish();
    }
}
