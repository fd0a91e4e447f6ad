use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{provider_error, ChatMessage, LlmClient, LlmResponse, Role, TokenUsage, ToolCall, ToolDefinition};

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Turn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

/// The messages API only knows `user` and `assistant`
#[derive(Serialize)]
struct Turn {
    role: Role,
    content: Vec<Block>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    ToolResult { tool_use_id: String, content: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Serialize)]
struct ToolSpec {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<Block>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Client for Anthropic's native messages API
pub struct AnthropicLlmClient {
    api_key: String,
    model: String,
    endpoint: String,
    agent_name: String,
    verbose: bool,
    http: reqwest::Client,
}

impl AnthropicLlmClient {
    /// `base_url` is the API root, e.g. `https://api.anthropic.com`
    pub fn new(api_key: String, model: String, base_url: String, agent_name: String) -> Self {
        Self {
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            api_key,
            model,
            agent_name,
            verbose: false,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn build_request(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> MessagesRequest<'_> {
        let (system, conversation): (Vec<_>, Vec<_>) =
            messages.into_iter().partition(|message| message.role == Role::System);
        let system = (!system.is_empty()).then(|| {
            system
                .iter()
                .map(|message| message.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        });

        let tools: Vec<ToolSpec> = tools
            .into_iter()
            .map(|tool| ToolSpec {
                name: tool.name,
                description: tool.description,
                input_schema: tool.parameters,
            })
            .collect();
        let tool_choice = (!tools.is_empty()).then(|| serde_json::json!({ "type": "auto" }));

        MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: conversation.into_iter().map(to_turn).collect(),
            tools,
            tool_choice,
        }
    }
}

/// Tool results ride on a user turn; assistant tool calls become `tool_use` blocks
fn to_turn(message: ChatMessage) -> Turn {
    if message.role == Role::Tool {
        return Turn {
            role: Role::User,
            content: vec![Block::ToolResult {
                tool_use_id: message.tool_call_id.unwrap_or_default(),
                content: message.content,
            }],
        };
    }

    let role = if message.role == Role::Assistant { Role::Assistant } else { Role::User };
    let calls = message.tool_calls.unwrap_or_default();
    let mut content = Vec::with_capacity(calls.len() + 1);
    if !message.content.is_empty() || calls.is_empty() {
        content.push(Block::Text { text: message.content });
    }
    for call in calls {
        let input = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| Value::Object(Default::default()));
        content.push(Block::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }
    Turn { role, content }
}

fn into_llm_response(reply: MessagesResponse) -> LlmResponse {
    let mut text = String::new();
    let mut calls = Vec::new();
    for block in reply.content {
        match block {
            Block::Text { text: part } => text.push_str(&part),
            Block::ToolUse { id, name, input } => calls.push(ToolCall::new(&id, &name, input)),
            Block::ToolResult { .. } | Block::Unsupported => {}
        }
    }

    LlmResponse {
        message: ChatMessage::assistant(text).with_tool_calls(calls),
        usage: reply.usage.map(|usage| TokenUsage {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
            total_tokens: usage.input_tokens + usage.output_tokens,
        }),
    }
}

#[async_trait]
impl LlmClient for AnthropicLlmClient {
    async fn chat(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> Result<LlmResponse> {
        let request = self.build_request(messages, tools);

        if self.verbose {
            let dump = serde_json::to_value(&request)?;
            agentdesk_logging::log_request(&self.endpoint, &dump, &self.api_key, true);
            let label = format!("{}-agent-{}", self.model, self.agent_name);
            if let Err(e) = agentdesk_logging::log_request_to_file(&self.endpoint, &dump, &label, &self.api_key) {
                log::warn!("could not write request log: {}", e);
            }
        }
        log::debug!("[{}] POST {} ({} turns)", self.agent_name, self.endpoint, request.messages.len());

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))?;
        if !response.status().is_success() {
            return Err(provider_error("Anthropic", response).await);
        }

        let reply: MessagesResponse = response.json().await.context("Failed to parse Anthropic response")?;
        Ok(into_llm_response(reply))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
