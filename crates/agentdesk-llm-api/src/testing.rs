//! Scripted client for exercising agents and workflows without a provider

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::client::{ChatMessage, LlmClient, LlmResponse, ToolCall, ToolDefinition};

/// Replays queued responses in order and records every request it receives
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, String>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    offered_tools: Mutex<Vec<Vec<String>>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            offered_tools: Mutex::new(Vec::new()),
        }
    }

    /// Client that answers each call with the next text in `replies`
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_text(reply);
        }
        client
    }

    /// Reply used once the queue is exhausted
    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    pub fn push_text(&self, reply: impl Into<String>) {
        self.push(Ok(LlmResponse {
            message: ChatMessage::assistant(reply),
            usage: None,
        }));
    }

    pub fn push_tool_calls(&self, calls: Vec<ToolCall>) {
        let mut message = ChatMessage::assistant("");
        message.tool_calls = Some(calls);
        self.push(Ok(LlmResponse { message, usage: None }));
    }

    pub fn push_error(&self, error: impl Into<String>) {
        self.push(Err(error.into()));
    }

    fn push(&self, item: Result<LlmResponse, String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(item);
        }
    }

    /// Every message list received so far, oldest first
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Names of the tools offered on each call, oldest first
    pub fn offered_tools(&self) -> Vec<Vec<String>> {
        self.offered_tools.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for ScriptedLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn chat(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> Result<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages);
        }
        if let Ok(mut offered) = self.offered_tools.lock() {
            offered.push(tools.into_iter().map(|t| t.name).collect());
        }

        let next = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        match (next, &self.fallback) {
            (Some(Ok(response)), _) => Ok(response),
            (Some(Err(error)), _) => Err(anyhow!(error)),
            (None, Some(fallback)) => Ok(LlmResponse {
                message: ChatMessage::assistant(fallback.clone()),
                usage: None,
            }),
            (None, None) => Err(anyhow!("no scripted response left")),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
