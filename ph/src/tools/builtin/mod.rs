//! Built-in planning tools

mod annotate_reasoning;
mod lookup_reference;
mod publish_plan;
mod read_plan;
mod save_draft;
mod validate_plan;

pub use annotate_reasoning::AnnotateReasoningTool;
pub use lookup_reference::LookupReferenceTool;
pub use publish_plan::PublishPlanTool;
pub use read_plan::ReadPlanTool;
pub use save_draft::SaveDraftTool;
pub use validate_plan::ValidatePlanTool;

use serde_json::{Value, json};

use crate::domain::{PlanError, PlanStatus};

/// Schema shared by the tools that take a whole plan
pub(crate) fn plan_json_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "plan_json": {
                "description": description,
                "anyOf": [
                    { "type": "string" },
                    { "type": "object" }
                ]
            }
        },
        "required": ["plan_json"]
    })
}

/// Read `plan_json`, given either as a JSON string or an inline object
pub(crate) fn plan_payload(input: &Value) -> Result<Value, String> {
    match input.get("plan_json") {
        Some(Value::String(text)) => serde_json::from_str(text)
            .map_err(|e| PlanError::Malformed(e.to_string()).to_string()),
        Some(Value::Null) | None => Err("Missing required parameter: plan_json".to_string()),
        Some(other) => Ok(other.clone()),
    }
}

/// Overwrite the payload's status; non-objects are left for the validator to reject
pub(crate) fn force_status(mut payload: Value, status: PlanStatus) -> Value {
    if let Some(obj) = payload.as_object_mut() {
        obj.insert("status".to_string(), Value::String(status.to_string()));
    }
    payload
}
