//! MemoryStore - tiered block storage
//!
//! Persists labelled text blocks at two scopes: one per conversation session
//! and one shared by every consumer of a deployment. A (label, scope) pair maps
//! to exactly one live block.
//!
//! # Architecture
//!
//! ```text
//! {store_dir}/
//! └── blocks.db        # SQLite, table `blocks`
//!     id | label | scope | value | version | created_at | updated_at
//! ```
//!
//! A block is created lazily with a placeholder value (`version == 0`) and
//! overwritten in place afterwards. Several writes can be committed together
//! so a session copy and its global mirror never diverge.
//!
//! # Example
//!
//! ```ignore
//! use memorystore::{BlockStore, Scope};
//!
//! let mut store = BlockStore::open(".memorystore")?;
//! store.get_or_create("global_contract_plan", &Scope::Global, "No plan yet.")?;
//! store.write("global_contract_plan", &Scope::Global, "{...}")?;
//! let current = store.read("global_contract_plan", &Scope::Global)?;
//! ```

pub mod cli;
pub mod config;
mod error;
mod store;

pub use error::StoreError;
pub use store::{Block, BlockRead, BlockStore, BlockWrite, Scope};

/// File name of the SQLite database inside the store directory
pub const DB_FILE: &str = "blocks.db";

/// Default busy timeout for contended writers (5s)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
