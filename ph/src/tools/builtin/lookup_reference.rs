//! LookupReference tool - ERC standard details

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::lookup_standard;
use crate::tools::{Tool, ToolContext, ToolResult};

/// LookupReference tool - returns a catalog entry as JSON
pub struct LookupReferenceTool;

#[async_trait]
impl Tool for LookupReferenceTool {
    fn name(&self) -> &'static str {
        "lookup_reference"
    }

    fn description(&self) -> &'static str {
        "Look up the functions and events an ERC standard already provides, so you do not ask the user about them."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "template_id": {
                    "type": "string",
                    "description": "Standard id such as ERC-20, ERC-721 or ERC-1155"
                }
            },
            "required": ["template_id"]
        })
    }

    async fn execute(&self, input: Value, _ctx: &ToolContext) -> ToolResult {
        let template_id = match input.get("template_id").and_then(|v| v.as_str()) {
            Some(id) => id,
            None => return ToolResult::error("Missing required parameter: template_id"),
        };

        match lookup_standard(template_id) {
            Ok(standard) => match serde_json::to_string_pretty(standard) {
                Ok(json) => ToolResult::success(json),
                Err(e) => ToolResult::error(format!("Failed to serialize standard: {}", e)),
            },
            Err(message) => ToolResult::error(message),
        }
    }
}
