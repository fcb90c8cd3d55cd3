//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use trileg_oauth::FlowOrchestrator;

use crate::pending::PendingTokens;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Flow driver; shared with blocking tasks.
    pub(crate) orchestrator: Arc<FlowOrchestrator>,
    /// Request-token secrets awaiting the provider's callback.
    pub(crate) pending: PendingTokens,
}

impl AppState {
    pub(crate) fn new(orchestrator: FlowOrchestrator) -> Self {
        Self::with_pending(orchestrator, PendingTokens::default())
    }

    pub(crate) fn with_pending(orchestrator: FlowOrchestrator, pending: PendingTokens) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            pending,
        }
    }
}
