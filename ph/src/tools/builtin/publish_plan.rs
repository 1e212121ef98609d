//! PublishPlan tool - mark the plan ready for code generation

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::domain::{PlanDocument, PlanStatus};
use crate::tools::{Tool, ToolContext, ToolResult};

use super::{force_status, plan_json_schema, plan_payload};

/// PublishPlan tool - validates readiness, stores the plan as `ready` and
/// flags the turn for finalization
pub struct PublishPlanTool;

#[async_trait]
impl Tool for PublishPlanTool {
    fn name(&self) -> &'static str {
        "publish_plan"
    }

    fn description(&self) -> &'static str {
        "Publish the final plan once the user has confirmed it is complete. \
         Every contract needs at least one function. The status is always stored as ready."
    }

    fn input_schema(&self) -> Value {
        plan_json_schema("The complete, confirmed plan document, as a JSON string or object")
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let payload = match plan_payload(&input) {
            Ok(payload) => force_status(payload, PlanStatus::Ready),
            Err(message) => return ToolResult::error(message),
        };

        let plan = match PlanDocument::from_value(&payload).and_then(|plan| plan.check_ready().map(|_| plan)) {
            Ok(plan) => plan,
            Err(e) => return ToolResult::error(format!("Plan not published. {}", e)),
        };

        match ctx.memory.save_plan(&ctx.session_id, plan).await {
            Ok(saved) => {
                ctx.mark_ready();
                info!(session_id = %ctx.session_id, project = %saved.project_name, "Plan published");
                ToolResult::success(format!(
                    "Plan published successfully! It is now ready for code generation.\n{}",
                    saved.summary()
                ))
            }
            Err(e) => ToolResult::error(format!("Plan not published. {}", e)),
        }
    }
}
