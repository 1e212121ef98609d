//! AnnotateReasoning tool - keep notes on design decisions

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::warn;

use crate::tools::{Tool, ToolContext, ToolResult};

/// AnnotateReasoning tool - appends to the session's reasoning notes
pub struct AnnotateReasoningTool;

#[async_trait]
impl Tool for AnnotateReasoningTool {
    fn name(&self) -> &'static str {
        "annotate_reasoning"
    }

    fn description(&self) -> &'static str {
        "Record why a design decision was made, e.g. why a standard was chosen or a feature left out."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "note": {
                    "type": "string",
                    "description": "The reasoning to remember"
                }
            },
            "required": ["note"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let note = match input.get("note").and_then(|v| v.as_str()) {
            Some(n) if !n.trim().is_empty() => n.trim(),
            _ => return ToolResult::error("Missing required parameter: note"),
        };

        // Notes are a set; tell the model when it repeats itself
        if let Ok(existing) = ctx.memory.read_notes(&ctx.session_id).await {
            if existing.iter().any(|n| n == note) {
                return ToolResult::success(format!("Note already recorded ({} total).", existing.len()));
            }
        }

        match ctx.memory.append_note(&ctx.session_id, note).await {
            Ok(notes) => ToolResult::success(format!("Note saved ({} total).", notes.len())),
            Err(e) => {
                warn!(session_id = %ctx.session_id, error = %e, "annotate_reasoning: note not saved");
                ToolResult::error(format!("Note not saved: {}", e))
            }
        }
    }
}
