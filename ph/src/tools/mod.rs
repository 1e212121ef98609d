//! Tool system for planning sessions
//!
//! Tools give the model read and write access to plan memory and the ERC
//! reference catalog. Every failure is reported back as a `ToolResult` with
//! `is_error` set; tools never panic or propagate errors to the orchestrator.

mod context;
mod executor;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use executor::ToolExecutor;
pub use traits::{Tool, ToolResult};
