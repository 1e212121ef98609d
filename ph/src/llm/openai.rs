//! OpenAI chat-completions client
//!
//! Requests and responses go through typed wire structs; the provider-neutral
//! conversation from `types` is flattened into OpenAI's role-per-message shape
//! on the way out (one `tool` message per tool result).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmClient, LlmError, Message, MessageContent, Role,
    StopReason, TokenUsage, ToolCall, ToolDefinition,
};
use crate::config::LlmConfig;

/// Retries after the first attempt for transient failures
const MAX_RETRIES: u32 = 3;

const INITIAL_BACKOFF_MS: u64 = 1000;

/// Used when a 429 carries no usable `retry-after`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl OpenAIClient {
    /// Build a client, reading the API key from the configured environment variable
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key =
            std::env::var(&config.api_key_env).map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
        })
    }

    fn chat_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        let max_tokens = request.max_tokens.min(self.max_tokens);
        let reasoning = uses_completion_tokens(&self.model);
        debug!(model = %self.model, max_tokens, reasoning, "chat_request: called");

        ChatRequest {
            model: &self.model,
            messages: wire_messages(&request.system_prompt, &request.messages),
            max_tokens: (!reasoning).then_some(max_tokens),
            max_completion_tokens: reasoning.then_some(max_tokens),
            temperature: (!reasoning).then_some(self.temperature),
            tool_choice: (!request.tools.is_empty()).then_some("auto"),
            tools: request.tools.iter().map(WireTool::from).collect(),
        }
    }

    /// One HTTP round trip, with the status mapped onto `LlmError`
    async fn send_once(&self, url: &str, body: &ChatRequest<'_>) -> Result<CompletionResponse, LlmError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(chat.into_completion())
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(model = %self.model, messages = request.messages.len(), "complete: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.chat_request(&request);

        let mut attempt = 0;
        loop {
            match self.send_once(&url, &body).await {
                Ok(response) => {
                    debug!(attempt, tokens = response.usage.total(), "complete: success");
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "complete: transient failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// o1/o3 and gpt-5 models take `max_completion_tokens` and reject `temperature`
fn uses_completion_tokens(model: &str) -> bool {
    ["o1", "o3", "gpt-5"].iter().any(|prefix| model.starts_with(prefix))
}

/// Delay before retry number `attempt` (1-based), doubling each time
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS << attempt.saturating_sub(1))
}

fn wire_messages(system_prompt: &str, messages: &[Message]) -> Vec<WireMessage> {
    let mut wire = vec![WireMessage::System {
        content: system_prompt.to_string(),
    }];

    for message in messages {
        match &message.content {
            MessageContent::Text(text) => wire.push(WireMessage::text(message.role, text.clone())),
            MessageContent::Blocks(blocks) => flatten_blocks(message.role, blocks, &mut wire),
        }
    }

    wire
}

/// A block message is either a batch of tool results or an agent turn with calls
fn flatten_blocks(role: Role, blocks: &[ContentBlock], wire: &mut Vec<WireMessage>) {
    let mut text = String::new();
    let mut calls = Vec::new();
    let mut results = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text: t } => text.push_str(t),
            ContentBlock::ToolUse { id, name, input } => calls.push(WireToolCall {
                id: id.clone(),
                kind: "function".to_string(),
                function: WireFunction {
                    name: name.clone(),
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id, content, ..
            } => results.push(WireMessage::Tool {
                tool_call_id: tool_use_id.clone(),
                content: content.clone(),
            }),
        }
    }

    if !results.is_empty() {
        wire.extend(results);
    } else if !calls.is_empty() {
        wire.push(WireMessage::Assistant {
            content: (!text.is_empty()).then_some(text),
            tool_calls: calls,
        });
    } else {
        wire.push(WireMessage::text(role, text));
    }
}

// Wire format: request

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum WireMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<WireToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl WireMessage {
    fn text(role: Role, content: String) -> Self {
        match role {
            Role::User => WireMessage::User { content },
            Role::Assistant => WireMessage::Assistant {
                content: Some(content),
                tool_calls: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionSpec<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

impl<'a> From<&'a ToolDefinition> for WireTool<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunctionSpec {
                name: &def.name,
                description: &def.description,
                parameters: &def.input_schema,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    function: WireFunction,
}

/// Tool arguments arrive as a JSON-encoded string
#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

// Wire format: response

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl ChatResponse {
    fn into_completion(self) -> CompletionResponse {
        let usage = self
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let Some(choice) = self.choices.into_iter().next() else {
            warn!("into_completion: response had no choices");
            return CompletionResponse {
                content: None,
                tool_calls: Vec::new(),
                stop_reason: StopReason::EndTurn,
                usage,
            };
        };

        CompletionResponse {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.into_iter().map(tool_call).collect(),
            stop_reason: stop_reason(choice.finish_reason.as_deref()),
            usage,
        }
    }
}

/// Undecodable arguments become an empty object; the tool then reports what is missing
fn tool_call(wire: WireToolCall) -> ToolCall {
    let input = serde_json::from_str(&wire.function.arguments).unwrap_or_else(|e| {
        warn!(tool = %wire.function.name, error = %e, "tool_call: arguments are not JSON");
        Value::Object(Default::default())
    });
    ToolCall::new(wire.id, wire.function.name, input)
}

fn stop_reason(finish_reason: Option<&str>) -> StopReason {
    match finish_reason {
        Some("tool_calls") | Some("function_call") => StopReason::ToolUse,
        Some("length") => StopReason::MaxTokens,
        Some("content_filter") => StopReason::ContentFilter,
        _ => StopReason::EndTurn,
    }
}
