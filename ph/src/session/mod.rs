//! Conversation orchestration
//!
//! Sessions, plan extraction from replies, system directives and the
//! orchestrator that ties them to the completion capability and tools.

mod extract;
mod model;
mod orchestrator;
mod prompts;

pub use extract::{ExtractionError, PLAN_SENTINEL, attempt_extraction, conversational_part, should_extract};
pub use model::{ConversationSession, SessionMode, Speaker, ToolInvocation, Turn, TurnState};
pub use orchestrator::{Orchestrator, TurnError, TurnReply};
pub use prompts::{CREATE_GREETING, PromptContext, PromptRenderer, UPDATE_GREETING};
