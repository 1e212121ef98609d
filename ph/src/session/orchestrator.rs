//! Orchestrator - drives planning conversations
//!
//! Each `send_message` runs one turn under the session's mutex: the completion
//! capability is called with the committed history, tool calls are executed
//! until the model replies in plain text, and a reply that signals a plan is
//! extracted, validated and persisted. The session only changes once the whole
//! turn succeeded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::domain::{PlanDocument, PlanStatus};
use crate::llm::{CompletionRequest, CompletionResponse, ContentBlock, LlmClient, Message};
use crate::memory::{MemoryError, MemoryManager};
use crate::tools::{ToolContext, ToolExecutor, ToolResult};

use super::extract::{attempt_extraction, conversational_part, has_payload, should_extract};
use super::model::{ConversationSession, SessionMode, ToolInvocation, Turn, TurnState};
use super::prompts::{CREATE_GREETING, PromptContext, PromptRenderer, REPROMPT, UPDATE_GREETING};

/// Shown when a plan was accepted and the reply had nothing else to say
const FINALIZED_TEXT: &str = "Your plan has been saved and is ready for the next step.";

/// Why a turn failed; the session is left as it was before the turn
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session {0} is finalized and accepts no more messages")]
    SessionFinalized(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Completion unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("Plan store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<MemoryError> for TurnError {
    fn from(err: MemoryError) -> Self {
        TurnError::StoreUnavailable(err.to_string())
    }
}

/// What the host sees after a turn
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub session_id: String,

    /// Conversational text of the agent's reply
    pub text: String,

    /// Names of the tools called during the turn, in order
    pub tool_calls: Vec<String>,

    pub state: TurnState,

    /// Plan accepted this turn, if the session finalized
    pub document: Option<PlanDocument>,
}

/// Result of the completion/tool loop for one turn
struct AgentReply {
    text: String,
    invocations: Vec<ToolInvocation>,
    published: bool,
}

/// How a signalled plan was resolved
enum Extraction {
    Accepted(PlanDocument),
    Rejected(String),
}

/// Owns all conversation sessions of the process
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    memory: MemoryManager,
    tools: ToolExecutor,
    prompts: PromptRenderer,
    settings: SessionConfig,
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationSession>>>>,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, memory: MemoryManager, settings: SessionConfig) -> eyre::Result<Self> {
        debug!(max_tool_rounds = settings.max_tool_rounds, "Orchestrator::new: called");
        Ok(Self {
            llm,
            memory,
            tools: ToolExecutor::planning(),
            prompts: PromptRenderer::new()?,
            settings,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    /// Start a session that builds a new plan; returns its id and opening reply
    pub async fn start_session(&self) -> Result<(String, String), TurnError> {
        self.open_session(SessionMode::Create).await
    }

    /// Start a session that edits the stored global plan
    ///
    /// Falls back to a create-mode session when nothing is stored yet.
    pub async fn resume_session(&self) -> Result<(String, String), TurnError> {
        let existing = self.memory.read_global(self.memory.global_label()).await?;
        let mode = if existing.is_some() {
            SessionMode::Update
        } else {
            info!("resume_session: no stored plan, starting in create mode");
            SessionMode::Create
        };
        self.open_session(mode).await
    }

    async fn open_session(&self, mode: SessionMode) -> Result<(String, String), TurnError> {
        let session = ConversationSession::new(mode);
        let session_id = session.id.clone();
        self.memory.ensure_session(&session_id).await?;

        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle.clone());
        info!(%session_id, %mode, "Session started");

        let greeting = match mode {
            SessionMode::Create => CREATE_GREETING,
            SessionMode::Update => UPDATE_GREETING,
        };

        let mut session = handle.lock().await;
        match self.run_turn(&mut session, greeting).await {
            Ok(reply) => Ok((session_id, reply.text)),
            Err(e) => {
                warn!(%session_id, error = %e, "open_session: opening turn failed, dropping session");
                drop(session);
                self.sessions.write().await.remove(&session_id);
                Err(e)
            }
        }
    }

    /// Run one user turn
    pub async fn send_message(&self, session_id: &str, text: &str) -> Result<TurnReply, TurnError> {
        debug!(%session_id, len = text.len(), "send_message: called");
        let text = text.trim();
        if text.is_empty() {
            return Err(TurnError::EmptyMessage);
        }

        let handle = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| TurnError::SessionNotFound(session_id.to_string()))?;

        // Held for the whole turn: one turn at a time per session
        let mut session = handle.lock().await;
        if session.is_finalized() {
            return Err(TurnError::SessionFinalized(session_id.to_string()));
        }

        self.run_turn(&mut session, text).await
    }

    /// Snapshot of a session
    pub async fn session(&self, session_id: &str) -> Option<ConversationSession> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Plan stored in the global tier
    pub async fn get_document(&self, label: &str) -> Result<Option<PlanDocument>, TurnError> {
        Ok(self.memory.read_global(label).await?)
    }

    /// Force the global plan to `ready`
    pub async fn approve(&self, label: &str) -> Result<PlanDocument, MemoryError> {
        info!(%label, "approve: called");
        self.memory.approve(label).await
    }

    async fn run_turn(&self, session: &mut ConversationSession, text: &str) -> Result<TurnReply, TurnError> {
        session.state = TurnState::AgentResponding;
        let result = self.try_turn(session, text).await;
        if let Err(e) = &result {
            warn!(session_id = %session.id, error = %e, "run_turn: turn failed, session unchanged");
            session.state = TurnState::AwaitingUserInput;
        }
        result
    }

    async fn try_turn(&self, session: &mut ConversationSession, text: &str) -> Result<TurnReply, TurnError> {
        let reply = self.respond(session, text).await?;
        let tool_calls: Vec<String> = reply.invocations.iter().map(|i| i.name.clone()).collect();

        if !should_extract(&reply.text, reply.published) {
            debug!(session_id = %session.id, "try_turn: plain reply");
            session.commit(Turn::user(text), Turn::agent(&reply.text, reply.invocations));
            session.state = TurnState::AwaitingUserInput;
            session.extraction_pending = false;
            session.last_failure = None;
            return Ok(TurnReply {
                session_id: session.id.clone(),
                text: reply.text,
                tool_calls,
                state: session.state,
                document: None,
            });
        }

        session.state = TurnState::ExtractingPlan;
        info!(session_id = %session.id, published = reply.published, "Extracting plan");
        let extraction = self.extract(&session.id, &reply).await?;

        let visible = conversational_part(&reply.text).to_string();
        session.commit(Turn::user(text), Turn::agent(&reply.text, reply.invocations));

        match extraction {
            Extraction::Accepted(document) => {
                info!(session_id = %session.id, project = %document.project_name, status = %document.status, "Session finalized");
                session.state = TurnState::Finalized;
                session.extraction_pending = false;
                session.last_failure = None;
                session.document = Some(document.clone());
                Ok(TurnReply {
                    session_id: session.id.clone(),
                    text: if visible.is_empty() { FINALIZED_TEXT.to_string() } else { visible },
                    tool_calls,
                    state: session.state,
                    document: Some(document),
                })
            }
            Extraction::Rejected(reason) => {
                warn!(session_id = %session.id, %reason, "Plan rejected");
                session.state = TurnState::AwaitingUserInput;
                session.extraction_pending = true;
                session.last_failure = Some(reason);
                Ok(TurnReply {
                    session_id: session.id.clone(),
                    text: if visible.is_empty() { REPROMPT.to_string() } else { visible },
                    tool_calls,
                    state: session.state,
                    document: None,
                })
            }
        }
    }

    /// Completion/tool loop until the model answers without tool calls
    async fn respond(&self, session: &ConversationSession, text: &str) -> Result<AgentReply, TurnError> {
        let system_prompt = self.system_prompt(session).await?;
        let ctx = ToolContext::new(&session.id, self.memory.clone());
        let tool_defs = self.tools.definitions();

        let mut messages = session.history();
        messages.push(Message::user(text));

        let mut invocations = Vec::new();
        let mut rounds = 0;

        loop {
            let request = CompletionRequest {
                system_prompt: system_prompt.clone(),
                messages: messages.clone(),
                tools: tool_defs.clone(),
                max_tokens: self.settings.max_tokens,
            };

            let response = self.complete(request).await?;
            if response.tool_calls.is_empty() {
                return Ok(AgentReply {
                    text: response.content.unwrap_or_default(),
                    invocations,
                    published: ctx.is_ready(),
                });
            }

            if rounds >= self.settings.max_tool_rounds {
                return Err(TurnError::CapabilityUnavailable(format!(
                    "model kept calling tools after {} rounds",
                    self.settings.max_tool_rounds
                )));
            }
            rounds += 1;

            debug!(session_id = %session.id, %rounds, calls = response.tool_calls.len(), "respond: executing tools");
            let results = self.tools.execute_all(&response.tool_calls, &ctx).await;

            for (call, (_, result)) in response.tool_calls.iter().zip(&results) {
                invocations.push(ToolInvocation {
                    name: call.name.clone(),
                    input: call.input.clone(),
                    output: result.content.clone(),
                    is_error: result.is_error,
                });
            }

            messages.push(assistant_message(&response));
            messages.push(tool_result_message(&results));
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, TurnError> {
        let call = self.llm.complete(request);
        let result = match self.settings.turn_timeout_ms {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), call)
                .await
                .map_err(|_| TurnError::CapabilityUnavailable(format!("completion timed out after {}ms", ms)))?,
            None => call.await,
        };
        result.map_err(|e| TurnError::CapabilityUnavailable(e.to_string()))
    }

    async fn system_prompt(&self, session: &ConversationSession) -> Result<String, TurnError> {
        let existing_plan = match session.mode {
            SessionMode::Create => None,
            SessionMode::Update => match self.memory.read_plan(&session.id).await? {
                Some(plan) => Some(
                    plan.to_json_pretty()
                        .map_err(|e| TurnError::StoreUnavailable(format!("stored plan unreadable: {}", e)))?,
                ),
                None => None,
            },
        };

        let context = PromptContext {
            existing_plan,
            last_failure: session.last_failure.clone(),
        };

        self.prompts
            .render(session.mode, &context)
            .map_err(|e| TurnError::CapabilityUnavailable(e.to_string()))
    }

    /// Resolve the plan a reply signalled; only store outages are errors
    async fn extract(&self, session_id: &str, reply: &AgentReply) -> Result<Extraction, TurnError> {
        if !has_payload(&reply.text) {
            // publish_plan already persisted the document
            return match self.memory.read_plan(session_id).await? {
                Some(document) => Ok(Extraction::Accepted(document)),
                None => Ok(Extraction::Rejected("publish_plan succeeded but no plan is stored".to_string())),
            };
        }

        let document = match attempt_extraction(&reply.text) {
            Ok(document) => document,
            Err(e) => return Ok(Extraction::Rejected(e.to_string())),
        };

        let status = if reply.published { PlanStatus::Ready } else { PlanStatus::Draft };
        let document = document.with_status(status);
        if status == PlanStatus::Ready {
            if let Err(e) = document.check_ready() {
                return Ok(Extraction::Rejected(e.to_string()));
            }
        }

        match self.memory.save_plan(session_id, document).await {
            Ok(saved) => Ok(Extraction::Accepted(saved)),
            Err(MemoryError::Plan(e)) => Ok(Extraction::Rejected(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

fn assistant_message(response: &CompletionResponse) -> Message {
    let mut blocks = Vec::new();

    if let Some(text) = &response.content {
        blocks.push(ContentBlock::text(text));
    }

    for call in &response.tool_calls {
        blocks.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        });
    }

    Message::assistant_blocks(blocks)
}

fn tool_result_message(results: &[(String, ToolResult)]) -> Message {
    let blocks = results
        .iter()
        .map(|(id, result)| ContentBlock::tool_result(id, &result.content, result.is_error))
        .collect();

    Message::user_blocks(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{LlmError, ToolCall};
    use crate::memory::GLOBAL_PLAN_LABEL;
    use async_trait::async_trait;
    use serde_json::json;

    const COIN_PLAN: &str = r#"{
        "project_name": "Coin",
        "description": "A mintable ERC-20 token",
        "contracts": [{
            "name": "Coin",
            "description": "The token",
            "erc_template": "ERC-20",
            "dependencies": ["Ownable"],
            "constructor": {"description": "Mints the initial supply", "inputs": []},
            "functions": [{
                "name": "mint",
                "description": "Create new tokens",
                "inputs": [
                    {"name": "to", "type": "address", "description": "Recipient"},
                    {"name": "amount", "type": "uint256", "description": "Amount"}
                ],
                "outputs": [],
                "conditions": ["Only the owner can mint"]
            }]
        }]
    }"#;

    fn orchestrator(responses: Vec<CompletionResponse>) -> (Orchestrator, Arc<MockLlmClient>) {
        orchestrator_with(responses, SessionConfig::default())
    }

    fn orchestrator_with(
        responses: Vec<CompletionResponse>,
        settings: SessionConfig,
    ) -> (Orchestrator, Arc<MockLlmClient>) {
        let client = Arc::new(MockLlmClient::new(responses));
        let memory = MemoryManager::in_memory(GLOBAL_PLAN_LABEL).unwrap();
        let orchestrator = Orchestrator::new(client.clone(), memory, settings).unwrap();
        (orchestrator, client)
    }

    fn plan_ready_reply() -> CompletionResponse {
        CompletionResponse::text(format!("Great, that's everything.\nPLAN_READY\n{}", COIN_PLAN))
    }

    #[tokio::test]
    async fn test_start_session_runs_opening_turn() {
        let (orch, client) = orchestrator(vec![CompletionResponse::text("Hi! What is your project called?")]);

        let (id, text) = orch.start_session().await.unwrap();
        assert_eq!(text, "Hi! What is your project called?");

        let session = orch.session(&id).await.unwrap();
        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[0].text, CREATE_GREETING);
        assert_eq!(session.state, TurnState::AwaitingUserInput);

        let request = &client.requests()[0];
        assert!(request.system_prompt.contains("PLAN_READY"));
        assert_eq!(request.tools.len(), 6);
    }

    #[tokio::test]
    async fn test_plan_ready_finalizes_as_draft() {
        let (orch, _) = orchestrator(vec![CompletionResponse::text("Hello!"), plan_ready_reply()]);
        let (id, _) = orch.start_session().await.unwrap();

        let reply = orch
            .send_message(&id, "ERC-20 called Coin, only the owner can mint")
            .await
            .unwrap();

        assert_eq!(reply.state, TurnState::Finalized);
        assert_eq!(reply.text, "Great, that's everything.");
        let document = reply.document.unwrap();
        assert_eq!(document.status, PlanStatus::Draft);

        let stored = orch.get_document(GLOBAL_PLAN_LABEL).await.unwrap().unwrap();
        assert_eq!(stored, document);
    }

    #[tokio::test]
    async fn test_finalized_session_rejects_messages() {
        let (orch, _) = orchestrator(vec![CompletionResponse::text("Hello!"), plan_ready_reply()]);
        let (id, _) = orch.start_session().await.unwrap();
        orch.send_message(&id, "Coin").await.unwrap();

        let err = orch.send_message(&id, "one more thing").await.unwrap_err();
        assert_eq!(err, TurnError::SessionFinalized(id));
    }

    #[tokio::test]
    async fn test_empty_and_unknown() {
        let (orch, _) = orchestrator(vec![CompletionResponse::text("Hello!")]);
        let (id, _) = orch.start_session().await.unwrap();

        assert_eq!(orch.send_message(&id, "   ").await.unwrap_err(), TurnError::EmptyMessage);
        assert!(matches!(
            orch.send_message("nope", "hi").await.unwrap_err(),
            TurnError::SessionNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_tool_calls_recorded_on_agent_turn() {
        let (orch, client) = orchestrator(vec![
            CompletionResponse::text("Hello!"),
            CompletionResponse::tools(vec![ToolCall::new(
                "call_1",
                "lookup_reference",
                json!({"template_id": "erc20"}),
            )]),
            CompletionResponse::text("ERC-20 already has transfer. Anything else?"),
        ]);
        let (id, _) = orch.start_session().await.unwrap();

        let reply = orch.send_message(&id, "A fungible token").await.unwrap();
        assert_eq!(reply.tool_calls, vec!["lookup_reference"]);
        assert_eq!(reply.state, TurnState::AwaitingUserInput);

        let session = orch.session(&id).await.unwrap();
        assert_eq!(session.turns.len(), 4);
        let agent = &session.turns[3];
        assert_eq!(agent.tool_calls.len(), 1);
        assert!(agent.tool_calls[0].output.contains("ERC-20"));

        // The tool result was fed back before the final reply
        let last = client.requests().pop().unwrap();
        assert_eq!(last.messages.len(), 5);
    }

    #[tokio::test]
    async fn test_tool_round_limit() {
        let looping = || {
            CompletionResponse::tools(vec![ToolCall::new("c", "read_plan", json!({}))])
        };
        let settings = SessionConfig {
            max_tool_rounds: 2,
            ..SessionConfig::default()
        };
        let (orch, _) = orchestrator_with(
            vec![CompletionResponse::text("Hello!"), looping(), looping(), looping()],
            settings,
        );
        let (id, _) = orch.start_session().await.unwrap();

        let err = orch.send_message(&id, "go").await.unwrap_err();
        assert!(matches!(err, TurnError::CapabilityUnavailable(_)));

        let session = orch.session(&id).await.unwrap();
        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.state, TurnState::AwaitingUserInput);
    }

    #[tokio::test]
    async fn test_capability_failure_leaves_session_unchanged() {
        let client = Arc::new(MockLlmClient::with_results(vec![
            Ok(CompletionResponse::text("Hello!")),
            Err("overloaded".to_string()),
            Ok(CompletionResponse::text("Which standard?")),
        ]));
        let memory = MemoryManager::in_memory(GLOBAL_PLAN_LABEL).unwrap();
        let orch = Orchestrator::new(client, memory, SessionConfig::default()).unwrap();
        let (id, _) = orch.start_session().await.unwrap();

        let err = orch.send_message(&id, "A token").await.unwrap_err();
        assert!(matches!(err, TurnError::CapabilityUnavailable(_)));
        assert_eq!(orch.session(&id).await.unwrap().turns.len(), 2);

        // Same message can be retried
        let reply = orch.send_message(&id, "A token").await.unwrap();
        assert_eq!(reply.text, "Which standard?");
        assert_eq!(orch.session(&id).await.unwrap().turns.len(), 4);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_fed_back() {
        let (orch, client) = orchestrator(vec![
            CompletionResponse::text("Hello!"),
            CompletionResponse::text("PLAN_READY\n{\"description\": \"no name\", \"contracts\": []}"),
            plan_ready_reply(),
        ]);
        let (id, _) = orch.start_session().await.unwrap();

        let reply = orch.send_message(&id, "Coin").await.unwrap();
        assert_eq!(reply.state, TurnState::AwaitingUserInput);
        assert_eq!(reply.text, REPROMPT);
        assert!(reply.document.is_none());

        let session = orch.session(&id).await.unwrap();
        assert!(session.extraction_pending);
        assert!(session.last_failure.as_deref().unwrap().contains("project_name"));
        assert!(orch.get_document(GLOBAL_PLAN_LABEL).await.unwrap().is_none());

        let reply = orch.send_message(&id, "It is called Coin").await.unwrap();
        assert_eq!(reply.state, TurnState::Finalized);

        let retry_prompt = &client.requests()[2].system_prompt;
        assert!(retry_prompt.contains("could not be accepted"));
        assert!(retry_prompt.contains("project_name"));
    }

    #[tokio::test]
    async fn test_publish_without_payload_finalizes_ready() {
        let (orch, _) = orchestrator(vec![
            CompletionResponse::text("Hello!"),
            CompletionResponse::tools(vec![ToolCall::new(
                "call_1",
                "publish_plan",
                json!({"plan_json": COIN_PLAN}),
            )]),
            CompletionResponse::text("Done! Your plan is published."),
        ]);
        let (id, _) = orch.start_session().await.unwrap();

        let reply = orch.send_message(&id, "Yes, publish it").await.unwrap();
        assert_eq!(reply.state, TurnState::Finalized);
        assert_eq!(reply.tool_calls, vec!["publish_plan"]);
        assert_eq!(reply.document.unwrap().status, PlanStatus::Ready);
    }

    #[tokio::test]
    async fn test_deployed_plan_rejects_extraction() {
        let (orch, _) = orchestrator(vec![CompletionResponse::text("Hello!"), plan_ready_reply()]);
        let seed = PlanDocument::from_json_str(COIN_PLAN).unwrap();
        orch.memory().save_plan("other", seed).await.unwrap();
        orch.memory()
            .set_status(GLOBAL_PLAN_LABEL, PlanStatus::Deployed)
            .await
            .unwrap();

        let (id, _) = orch.start_session().await.unwrap();
        let reply = orch.send_message(&id, "Coin again").await.unwrap();

        assert_eq!(reply.state, TurnState::AwaitingUserInput);
        let session = orch.session(&id).await.unwrap();
        assert!(session.last_failure.unwrap().contains("Illegal status transition"));
    }

    #[tokio::test]
    async fn test_resume_uses_update_mode() {
        let (orch, client) = orchestrator(vec![
            CompletionResponse::text("Hello!"),
            CompletionResponse::text("What would you like to change?"),
        ]);
        // Nothing stored: create mode
        let (first, _) = orch.start_session().await.unwrap();
        assert_eq!(orch.session(&first).await.unwrap().mode, SessionMode::Create);

        let seed = PlanDocument::from_json_str(COIN_PLAN).unwrap();
        orch.memory().save_plan(&first, seed).await.unwrap();

        let (id, text) = orch.resume_session().await.unwrap();
        assert_eq!(text, "What would you like to change?");
        let session = orch.session(&id).await.unwrap();
        assert_eq!(session.mode, SessionMode::Update);
        assert_eq!(session.turns[0].text, UPDATE_GREETING);

        let prompt = &client.requests()[1].system_prompt;
        assert!(prompt.contains("\"project_name\": \"Coin\""));
    }

    #[tokio::test]
    async fn test_resume_without_plan_falls_back_to_create() {
        let (orch, _) = orchestrator(vec![CompletionResponse::text("Hello!")]);
        let (id, _) = orch.resume_session().await.unwrap();
        assert_eq!(orch.session(&id).await.unwrap().mode, SessionMode::Create);
    }

    #[tokio::test]
    async fn test_failed_opening_turn_drops_session() {
        let (orch, _) = orchestrator(vec![]);
        assert!(orch.start_session().await.is_err());
        assert!(orch.sessions.read().await.is_empty());
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(CompletionResponse::text("too late"))
        }
    }

    #[tokio::test]
    async fn test_turn_timeout() {
        let memory = MemoryManager::in_memory(GLOBAL_PLAN_LABEL).unwrap();
        let settings = SessionConfig {
            turn_timeout_ms: Some(20),
            ..SessionConfig::default()
        };
        let orch = Orchestrator::new(Arc::new(SlowClient), memory, settings).unwrap();

        let err = orch.start_session().await.unwrap_err();
        match err {
            TurnError::CapabilityUnavailable(message) => assert!(message.contains("timed out")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_approve_and_get_document() {
        let (orch, _) = orchestrator(vec![]);
        assert!(orch.get_document(GLOBAL_PLAN_LABEL).await.unwrap().is_none());

        let seed = PlanDocument::from_json_str(COIN_PLAN).unwrap();
        orch.memory().save_plan("s1", seed).await.unwrap();

        let approved = orch.approve(GLOBAL_PLAN_LABEL).await.unwrap();
        assert_eq!(approved.status, PlanStatus::Ready);
    }
}
