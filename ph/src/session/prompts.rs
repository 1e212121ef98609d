//! System directives for planning sessions
//!
//! Templates are compiled into the binary from `ph/prompts/*.pmt` and rendered
//! with handlebars.

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::model::SessionMode;

const PLANNING_TEMPLATE: &str = include_str!("../../prompts/planning.pmt");
const UPDATE_TEMPLATE: &str = include_str!("../../prompts/update.pmt");
const SCHEMA_PARTIAL: &str = include_str!("../../prompts/schema.pmt");

/// First user message of a new planning session
pub const CREATE_GREETING: &str = "Hello, I want to plan a new smart contract.";

/// First user message of a session that edits the stored plan
pub const UPDATE_GREETING: &str = "Hello, I want to make changes to my existing smart contract plan.";

/// Reply shown when the agent's plan was rejected and it said nothing else
pub const REPROMPT: &str =
    "I couldn't finalize the plan yet. Could you confirm the details so I can try again?";

/// Values a template may reference
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// Pretty JSON of the stored plan (update mode)
    pub existing_plan: Option<String>,

    /// Why the last signalled plan was rejected
    pub last_failure: Option<String>,
}

/// Renders the system directive for each turn
pub struct PromptRenderer {
    hbs: Handlebars<'static>,
}

impl PromptRenderer {
    pub fn new() -> Result<Self> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.register_partial("schema", SCHEMA_PARTIAL)
            .map_err(|e| eyre!("Failed to register schema partial: {}", e))?;
        hbs.register_template_string(template_name(SessionMode::Create), PLANNING_TEMPLATE)
            .map_err(|e| eyre!("Failed to register planning template: {}", e))?;
        hbs.register_template_string(template_name(SessionMode::Update), UPDATE_TEMPLATE)
            .map_err(|e| eyre!("Failed to register update template: {}", e))?;
        Ok(Self { hbs })
    }

    /// Render the directive for a session in `mode`
    pub fn render(&self, mode: SessionMode, context: &PromptContext) -> Result<String> {
        let name = template_name(mode);
        debug!(%name, has_failure = context.last_failure.is_some(), "render: called");
        self.hbs
            .render(name, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }
}

fn template_name(mode: SessionMode) -> &'static str {
    match mode {
        SessionMode::Create => "planning",
        SessionMode::Update => "update",
    }
}
