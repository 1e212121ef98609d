//! ConversationSession domain type
//!
//! Tracks one planning conversation: its turns, where the state machine is,
//! and the document it produced.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::domain::PlanDocument;
use crate::llm::Message;

/// Whether the session builds a new plan or edits the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Create,
    Update,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Where the conversation state machine is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TurnState {
    /// Waiting for the next user message
    #[default]
    AwaitingUserInput,
    /// Completion and tool calls in flight
    AgentResponding,
    /// Reply signalled a plan; parsing and persisting it
    ExtractingPlan,
    /// A plan was accepted; the session takes no more messages
    Finalized,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingUserInput => write!(f, "awaiting-user-input"),
            Self::AgentResponding => write!(f, "agent-responding"),
            Self::ExtractingPlan => write!(f, "extracting-plan"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// A tool call the agent made while producing its reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub input: Value,
    pub output: String,
    pub is_error: bool,
}

/// One message in the conversation
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn agent(text: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
            tool_calls,
        }
    }

    /// The turn as an LLM message (tool calls are not replayed)
    pub fn to_message(&self) -> Message {
        match self.speaker {
            Speaker::User => Message::user(&self.text),
            Speaker::Agent => Message::assistant(&self.text),
        }
    }
}

/// A planning conversation
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSession {
    /// UUID v7
    pub id: String,

    pub mode: SessionMode,

    /// Committed turns, oldest first
    pub turns: Vec<Turn>,

    /// The last reply signalled a plan that still has to be accepted
    pub extraction_pending: bool,

    pub state: TurnState,

    /// Why the last signalled plan was rejected; shown to the model next turn
    pub last_failure: Option<String>,

    /// Plan accepted when the session finalized
    pub document: Option<PlanDocument>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(mode: SessionMode) -> Self {
        let now = Utc::now();
        let id = Uuid::now_v7().to_string();
        debug!(%id, %mode, "ConversationSession::new: called");
        Self {
            id,
            mode,
            turns: Vec::new(),
            extraction_pending: false,
            state: TurnState::AwaitingUserInput,
            last_failure: None,
            document: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.state == TurnState::Finalized
    }

    /// Committed history as LLM messages
    pub fn history(&self) -> Vec<Message> {
        self.turns.iter().map(Turn::to_message).collect()
    }

    /// Append a completed user/agent exchange
    pub fn commit(&mut self, user: Turn, agent: Turn) {
        debug!(id = %self.id, turns = self.turns.len(), "ConversationSession::commit: called");
        self.turns.push(user);
        self.turns.push(agent);
        self.updated_at = Utc::now();
    }

    /// Tool calls made across the whole conversation
    pub fn tool_call_count(&self) -> usize {
        self.turns.iter().map(|t| t.tool_calls.len()).sum()
    }
}
