//! Memory manager messages
//!
//! Commands and responses for the actor pattern.

use memorystore::StoreError;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{PlanDocument, PlanError, PlanStatus};

/// Errors from memory operations
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("No plan stored under '{0}'")]
    NoDocument(String),

    #[error("Store corrupted: {0}")]
    Corrupt(String),

    #[error("Channel error")]
    ChannelError,
}

impl From<StoreError> for MemoryError {
    fn from(err: StoreError) -> Self {
        if err.is_corruption() {
            MemoryError::Corrupt(err.to_string())
        } else {
            MemoryError::Store(err.to_string())
        }
    }
}

impl MemoryError {
    /// Check if the store itself failed (as opposed to a rejected plan)
    pub fn is_store_failure(&self) -> bool {
        matches!(self, MemoryError::Store(_) | MemoryError::Corrupt(_) | MemoryError::ChannelError)
    }
}

/// Response from memory operations
pub type MemoryResponse<T> = Result<T, MemoryError>;

/// Commands sent to the MemoryManager actor
#[derive(Debug)]
pub enum MemoryCommand {
    /// Create the session's plan and notes blocks (and the global plan block) if absent
    EnsureSession {
        session_id: String,
        reply: oneshot::Sender<MemoryResponse<()>>,
    },
    /// Session working copy, falling back to the global copy
    ReadPlan {
        session_id: String,
        reply: oneshot::Sender<MemoryResponse<Option<PlanDocument>>>,
    },
    /// Plan stored in the global tier under `label`
    ReadGlobal {
        label: String,
        reply: oneshot::Sender<MemoryResponse<Option<PlanDocument>>>,
    },
    /// Check the transition, then write the session copy and its global mirror together
    SavePlan {
        session_id: String,
        document: PlanDocument,
        reply: oneshot::Sender<MemoryResponse<PlanDocument>>,
    },
    /// Force the global plan to `ready`
    Approve {
        label: String,
        reply: oneshot::Sender<MemoryResponse<PlanDocument>>,
    },
    /// Advance the global plan's status (pipeline stages)
    SetStatus {
        label: String,
        status: PlanStatus,
        reply: oneshot::Sender<MemoryResponse<PlanDocument>>,
    },
    AppendNote {
        session_id: String,
        note: String,
        reply: oneshot::Sender<MemoryResponse<Vec<String>>>,
    },
    ReadNotes {
        session_id: String,
        reply: oneshot::Sender<MemoryResponse<Vec<String>>>,
    },
    Shutdown,
}
