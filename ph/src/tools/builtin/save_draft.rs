//! SaveDraft tool - persist a work-in-progress plan

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::domain::{PlanDocument, PlanStatus};
use crate::tools::{Tool, ToolContext, ToolResult};

use super::{force_status, plan_json_schema, plan_payload};

/// SaveDraft tool - validates and stores the plan with status `draft`
pub struct SaveDraftTool;

#[async_trait]
impl Tool for SaveDraftTool {
    fn name(&self) -> &'static str {
        "save_draft"
    }

    fn description(&self) -> &'static str {
        "Save the plan as a draft. Call this whenever the user has told you something that changes the plan. \
         The status is always stored as draft."
    }

    fn input_schema(&self) -> Value {
        plan_json_schema("The full plan document, as a JSON string or object")
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let payload = match plan_payload(&input) {
            Ok(payload) => force_status(payload, PlanStatus::Draft),
            Err(message) => return ToolResult::error(message),
        };

        let plan = match PlanDocument::from_value(&payload) {
            Ok(plan) => plan,
            Err(e) => return ToolResult::error(format!("Draft not saved. {}", e)),
        };

        match ctx.memory.save_plan(&ctx.session_id, plan).await {
            Ok(saved) => {
                info!(session_id = %ctx.session_id, project = %saved.project_name, "Draft saved");
                ToolResult::success(format!("Draft saved.\n{}", saved.summary()))
            }
            Err(e) => ToolResult::error(format!("Draft not saved. {}", e)),
        }
    }
}
