//! ReadPlan tool - show the plan the session is working on

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::memory::NO_PLAN_PLACEHOLDER;
use crate::tools::{Tool, ToolContext, ToolResult};

/// ReadPlan tool - current session copy, else the shared copy
pub struct ReadPlanTool;

#[async_trait]
impl Tool for ReadPlanTool {
    fn name(&self) -> &'static str {
        "read_plan"
    }

    fn description(&self) -> &'static str {
        "Read the current contract plan. Call this before editing so you build on what is already saved."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _input: Value, ctx: &ToolContext) -> ToolResult {
        match ctx.memory.read_plan(&ctx.session_id).await {
            Ok(Some(plan)) => match plan.to_json_pretty() {
                Ok(json) => ToolResult::success(json),
                Err(e) => ToolResult::error(format!("Failed to serialize plan: {}", e)),
            },
            Ok(None) => ToolResult::success(NO_PLAN_PLACEHOLDER),
            Err(e) => ToolResult::error(format!("Failed to read plan: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanDocument;

    #[tokio::test]
    async fn test_read_plan_empty() {
        let ctx = ToolContext::in_memory("s1");
        let result = ReadPlanTool.execute(json!({}), &ctx).await;

        assert!(!result.is_error);
        assert_eq!(result.content, "No plan yet.");
    }

    #[tokio::test]
    async fn test_read_plan_returns_saved_json() {
        let ctx = ToolContext::in_memory("s1");
        let plan = PlanDocument::from_value(&json!({
            "project_name": "Coin",
            "description": "A token",
            "contracts": []
        }))
        .unwrap();
        ctx.memory.save_plan("s1", plan).await.unwrap();

        let result = ReadPlanTool.execute(json!({}), &ctx).await;
        assert!(!result.is_error);
        let parsed: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(parsed["project_name"], "Coin");
        assert_eq!(parsed["status"], "draft");
    }

    #[tokio::test]
    async fn test_read_plan_after_shutdown_is_error() {
        let ctx = ToolContext::in_memory("s1");
        ctx.memory.shutdown().await.unwrap();
        tokio::task::yield_now().await;

        let result = ReadPlanTool.execute(json!({}), &ctx).await;
        assert!(result.is_error);
    }
}
