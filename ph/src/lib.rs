//! PartyHat - conversational smart contract planner
//!
//! A multi-turn conversation builds a structured plan of the contracts a user
//! wants, and the plan is persisted to a tiered block store where downstream
//! stages (code generation, testing, deployment) pick it up.
//!
//! # Modules
//!
//! - [`domain`] - Plan document, validator and ERC reference catalog
//! - [`memory`] - Actor that owns the block store and enforces plan rules
//! - [`tools`] - Tools the model calls to read and write the plan
//! - [`llm`] - Completion capability trait and OpenAI implementation
//! - [`session`] - Conversation orchestrator
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod memory;
pub mod repl;
pub mod session;
pub mod tools;

pub use config::{Config, LlmConfig, SessionConfig, StorageConfig};
pub use domain::{PlanDocument, PlanError, PlanStatus};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use memory::{MemoryError, MemoryManager};
pub use session::{ConversationSession, Orchestrator, SessionMode, TurnError, TurnReply, TurnState};
pub use tools::{Tool, ToolContext, ToolExecutor, ToolResult};
