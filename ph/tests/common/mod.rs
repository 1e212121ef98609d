//! Scripted completion clients shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use partyhat::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, MessageContent};

/// Replays canned responses in order
pub struct ScriptedClient {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse("script exhausted".to_string()))
    }
}

/// Replies with the last user text it was sent
pub struct EchoClient;

#[async_trait]
impl LlmClient for EchoClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tokio::task::yield_now().await;
        let last = request
            .messages
            .iter()
            .rev()
            .find_map(|m| match &m.content {
                MessageContent::Text(text) => Some(text.clone()),
                MessageContent::Blocks(_) => None,
            })
            .unwrap_or_default();
        Ok(CompletionResponse::text(format!("echo: {}", last)))
    }
}

/// The plan an agent produces for "an ERC-20 called Coin, only the owner can mint"
pub const COIN_PLAN: &str = r#"{
  "project_name": "Coin",
  "description": "A mintable ERC-20 token",
  "contracts": [
    {
      "name": "CoinToken",
      "description": "Fungible token with owner-only minting",
      "erc_template": "ERC-20",
      "dependencies": ["Ownable"],
      "constructor": {
        "description": "Sets name and symbol",
        "inputs": [
          {"name": "initialOwner", "type": "address", "description": "Owner allowed to mint"}
        ]
      },
      "functions": [
        {
          "name": "mint",
          "description": "Create new tokens",
          "inputs": [
            {"name": "to", "type": "address", "description": "Recipient"},
            {"name": "amount", "type": "uint256", "description": "Number of tokens"}
          ],
          "outputs": [],
          "conditions": ["Only the owner can call mint"]
        }
      ]
    }
  ]
}"#;
