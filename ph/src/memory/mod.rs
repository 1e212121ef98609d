//! Plan memory for PartyHat
//!
//! The `MemoryManager` actor owns the block store and applies plan rules
//! (status transitions, session to global mirroring) inside its single-writer
//! loop, so every read-check-write sequence is exclusive.

mod manager;
mod messages;

pub use manager::MemoryManager;
pub use messages::{MemoryCommand, MemoryError, MemoryResponse};

/// Session-scoped working copy of the plan
pub const SESSION_PLAN_LABEL: &str = "current_plan";

/// Session-scoped reasoning notes
pub const NOTES_LABEL: &str = "user_context";

/// Default label of the shared plan downstream stages consume
pub const GLOBAL_PLAN_LABEL: &str = "global_contract_plan";

/// Initial value of a plan block that was never written
pub const NO_PLAN_PLACEHOLDER: &str = "No plan yet.";

/// Initial value of a notes block that was never written
pub const NO_CONTEXT_PLACEHOLDER: &str = "No user context yet.";
