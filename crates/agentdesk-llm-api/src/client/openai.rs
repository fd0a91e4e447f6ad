use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{provider_error, ChatMessage, Role, LlmClient, LlmResponse, TokenUsage, ToolCall, ToolDefinition};

/// Client for OpenAI-compatible chat-completion endpoints (OpenAI, Groq, llama.cpp)
pub struct OpenAiClient {
    api_key: String,
    model: String,
    api_url: String,
    agent_name: String,
    temperature: Option<f32>,
    verbose: bool,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, api_url: String, agent_name: String) -> Self {
        Self {
            api_key,
            model,
            api_url,
            agent_name,
            temperature: None,
            verbose: false,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Dump every request to `logs/` and the console
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_chat_request(&self, messages: &[ChatMessage], tools: Vec<ToolDefinition>) -> serde_json::Value {
        let mut request = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if !tools.is_empty() {
            let tool_definitions: Vec<serde_json::Value> = tools
                .into_iter()
                .map(|tool| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            request["tools"] = serde_json::Value::Array(tool_definitions);
            request["tool_choice"] = serde_json::Value::from("auto");
        }

        if let Some(temperature) = self.temperature {
            request["temperature"] = serde_json::Value::from(temperature);
        }

        request
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(&self, messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> Result<LlmResponse> {
        let request = self.build_chat_request(&messages, tools);

        if self.verbose {
            agentdesk_logging::log_request(&self.api_url, &request, &self.api_key, true);
            if let Err(e) = agentdesk_logging::log_request_to_file(
                &self.api_url,
                &request,
                &format!("{}-agent-{}", self.model, self.agent_name),
                &self.api_key,
            ) {
                log::warn!("could not write request log: {}", e);
            }
        }
        log::debug!("[{}] POST {} ({} messages)", self.agent_name, self.api_url, messages.len());

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.api_url))?;

        if !response.status().is_success() {
            return Err(provider_error("OpenAI-compatible", response).await);
        }

        let status = response.status().as_u16();
        let response_text = response.text().await?;
        agentdesk_logging::log_response(status, &response_text, self.verbose);

        let completion: CompletionResponse = serde_json::from_str(&response_text)
            .context("Failed to parse chat completion response")?;

        let message = match completion.choices.into_iter().next() {
            Some(choice) => ChatMessage::new(
                choice.message.role.unwrap_or(Role::Assistant),
                choice.message.content.unwrap_or_default(),
            )
            .with_tool_calls(choice.message.tool_calls.unwrap_or_default()),
            None => ChatMessage::assistant("No response generated"),
        };

        Ok(LlmResponse {
            message,
            usage: completion.usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_tools_when_empty() {
        let client = OpenAiClient::new("k".into(), "gpt-4o".into(), "http://x".into(), "a".into())
            .with_temperature(0.1);
        let request = client.build_chat_request(&[ChatMessage::user("hi")], vec![]);

        assert!(request.get("tools").is_none());
        assert!(request.get("tool_choice").is_none());
        assert_eq!(request["messages"][0]["content"], "hi");
        assert!((request["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_request_wraps_tools_as_functions() {
        let client = OpenAiClient::new("k".into(), "gpt-4o".into(), "http://x".into(), "a".into());
        let tools = vec![ToolDefinition {
            name: "read_file".into(),
            description: "Read a file".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let request = client.build_chat_request(&[ChatMessage::user("hi")], tools);

        assert_eq!(request["tools"][0]["type"], "function");
        assert_eq!(request["tools"][0]["function"]["name"], "read_file");
        assert_eq!(request["tool_choice"], "auto");
    }
}
