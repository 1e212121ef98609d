//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::context::ToolContext;

/// A capability the planning agent can invoke by name
///
/// Implementations validate their own input and report every failure through
/// [`ToolResult::error`], so the model sees the reason and can correct itself.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in its tool calls
    fn name(&self) -> &'static str;

    /// Tells the model when to call this tool
    fn description(&self) -> &'static str;

    /// JSON Schema of the input object
    fn input_schema(&self) -> Value;

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// Text handed back to the model for one tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}
