//! ToolExecutor - manages tool execution for a session

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::llm::{ToolCall, ToolDefinition};

use super::builtin::{
    AnnotateReasoningTool, LookupReferenceTool, PublishPlanTool, ReadPlanTool, SaveDraftTool, ValidatePlanTool,
};
use super::{Tool, ToolContext, ToolResult};

/// Manages tool execution for a session
pub struct ToolExecutor {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolExecutor {
    /// Create executor with the planning tools
    pub fn planning() -> Self {
        let mut executor = Self::empty();

        // Plan memory
        executor.add_tool(Box::new(ReadPlanTool));
        executor.add_tool(Box::new(SaveDraftTool));
        executor.add_tool(Box::new(PublishPlanTool));
        executor.add_tool(Box::new(AnnotateReasoningTool));

        // Pure lookups
        executor.add_tool(Box::new(LookupReferenceTool));
        executor.add_tool(Box::new(ValidatePlanTool));

        executor
    }

    /// Create an empty executor (for testing)
    pub fn empty() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Add a tool to the executor
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get tool definitions for LLM, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_call: &ToolCall, ctx: &ToolContext) -> ToolResult {
        debug!(tool = %tool_call.name, id = %tool_call.id, "execute: called");
        match self.tools.get(&tool_call.name) {
            Some(tool) => {
                let result = tool.execute(tool_call.input.clone(), ctx).await;
                if result.is_error {
                    warn!(tool = %tool_call.name, content = %result.content, "execute: tool reported an error");
                }
                result
            }
            None => ToolResult::error(format!("Unknown tool: {}", tool_call.name)),
        }
    }

    /// Execute multiple tool calls in order
    pub async fn execute_all(&self, tool_calls: &[ToolCall], ctx: &ToolContext) -> Vec<(String, ToolResult)> {
        let mut results = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            let result = self.execute(call, ctx).await;
            results.push((call.id.clone(), result));
        }

        results
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::planning()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_planning_executor_has_all_tools() {
        let executor = ToolExecutor::planning();

        assert_eq!(
            executor.tool_names(),
            vec![
                "annotate_reasoning",
                "lookup_reference",
                "publish_plan",
                "read_plan",
                "save_draft",
                "validate_plan",
            ]
        );
    }

    #[test]
    fn test_definitions_are_sorted_and_described() {
        let executor = ToolExecutor::planning();
        let defs = executor.definitions();

        assert_eq!(defs.len(), 6);
        assert_eq!(defs[0].name, "annotate_reasoning");
        assert!(defs.iter().all(|d| !d.description.is_empty()));
        assert!(defs.iter().all(|d| d.input_schema["type"] == "object"));
    }

    #[test]
    fn test_empty_executor() {
        let executor = ToolExecutor::empty();
        assert!(executor.definitions().is_empty());
        assert!(!executor.has_tool("read_plan"));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let executor = ToolExecutor::planning();
        let ctx = ToolContext::in_memory("s1");

        let call = ToolCall::new("call_1", "deploy_now", json!({}));

        let result = executor.execute(&call, &ctx).await;
        assert!(result.is_error);
        assert!(result.content.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_execute_all_keeps_call_order() {
        let executor = ToolExecutor::planning();
        let ctx = ToolContext::in_memory("s1");

        let calls = vec![
            ToolCall::new("a", "lookup_reference", json!({"template_id": "erc20"})),
            ToolCall::new("b", "read_plan", json!({})),
        ];

        let results = executor.execute_all(&calls, &ctx).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert!(results[0].1.content.contains("ERC-20"));
        assert_eq!(results[1].0, "b");
        assert!(results[1].1.content.contains("No plan yet"));
    }
}
