//! ValidatePlan tool - check a plan without saving it

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::PlanDocument;
use crate::tools::{Tool, ToolContext, ToolResult};

use super::{plan_json_schema, plan_payload};

/// ValidatePlan tool - runs the validator only
pub struct ValidatePlanTool;

#[async_trait]
impl Tool for ValidatePlanTool {
    fn name(&self) -> &'static str {
        "validate_plan"
    }

    fn description(&self) -> &'static str {
        "Check a plan against the schema without saving it. Use this before publishing to catch mistakes."
    }

    fn input_schema(&self) -> Value {
        plan_json_schema("The plan document to check, as a JSON string or object")
    }

    async fn execute(&self, input: Value, _ctx: &ToolContext) -> ToolResult {
        let payload = match plan_payload(&input) {
            Ok(payload) => payload,
            Err(message) => return ToolResult::error(message),
        };

        let plan = match PlanDocument::from_value(&payload) {
            Ok(plan) => plan,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let readiness = match plan.check_ready() {
            Ok(()) => "Ready to publish.".to_string(),
            Err(e) => format!("Valid as a draft, not yet publishable: {}", e),
        };

        ToolResult::success(format!("Plan is valid.\n{}\n{}", plan.summary(), readiness))
    }
}
