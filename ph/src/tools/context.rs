//! ToolContext - execution context for tools

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::memory::MemoryManager;

/// Execution context for tools - scoped to a single turn of one session
#[derive(Clone)]
pub struct ToolContext {
    /// Session the turn belongs to
    pub session_id: String,

    /// Handle to plan memory
    pub memory: MemoryManager,

    /// Set by `publish_plan` once a ready plan is persisted this turn
    ready: Arc<AtomicBool>,
}

impl ToolContext {
    pub fn new(session_id: impl Into<String>, memory: MemoryManager) -> Self {
        let session_id = session_id.into();
        debug!(%session_id, "ToolContext::new: called");
        Self {
            session_id,
            memory,
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Record that the plan was published during this turn
    pub fn mark_ready(&self) {
        debug!(session_id = %self.session_id, "ToolContext::mark_ready: called");
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Context over a fresh in-memory store
    #[cfg(test)]
    pub(crate) fn in_memory(session_id: &str) -> Self {
        let memory = MemoryManager::in_memory(crate::memory::GLOBAL_PLAN_LABEL).unwrap();
        Self::new(session_id, memory)
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("session_id", &self.session_id)
            .field("ready", &self.is_ready())
            .finish()
    }
}
