//! Completion request/response types
//!
//! A conversation is a list of role-tagged messages. A message carries either
//! plain text or the blocks of a tool round: the calls the agent made and the
//! results the orchestrator sent back. Providers translate these into their
//! own wire format.

use serde_json::Value;

/// Everything needed for one completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Directive for this turn (create or update mode)
    pub system_prompt: String,

    /// Committed history plus the in-flight turn, oldest first
    pub messages: Vec<Message>,

    pub tools: Vec<ToolDefinition>,

    /// Token budget for the reply
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text(text.into()))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text(text.into()))
    }

    /// Tool results travel back on the user side
    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self::new(Role::User, MessageContent::Blocks(blocks))
    }

    /// Agent turn that requested tool calls
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self::new(Role::Assistant, MessageContent::Blocks(blocks))
    }

    fn new(role: Role, content: MessageContent) -> Self {
        Self { role, content }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(_) => None,
        }
    }
}

/// One piece of a tool round
#[derive(Debug, Clone)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error,
        }
    }
}

/// What the model answered
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Visible text; None when the model only called tools
    pub content: Option<String>,

    pub tool_calls: Vec<ToolCall>,

    pub stop_reason: StopReason,

    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain reply, the shape that ends a tool loop
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    /// Reply made only of tool calls
    pub fn tools(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }
    }
}

/// A tool invocation the model asked for
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    ContentFilter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// A tool as advertised to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool's input object
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}
