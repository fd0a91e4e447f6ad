use anyhow::{bail, Result};
use std::sync::Arc;

use crate::client::{anthropic::AnthropicLlmClient, openai::OpenAiClient, LlmClient};
use crate::config::{chat_completions_url, BackendType, ModelSpec, DEFAULT_MODEL};

/// Inputs for one client; unset key and URL fall back to the backend defaults
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub backend: BackendType,
    pub model: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    /// Shows up in request logs
    pub agent_name: String,
    pub verbose: bool,
}

impl ClientOptions {
    pub fn new(backend: BackendType, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            api_key: None,
            api_url: None,
            agent_name: "default".to_string(),
            verbose: false,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn resolved_key(&self) -> String {
        self.api_key
            .clone()
            .or_else(|| self.backend.key_env_var().and_then(|var| std::env::var(var).ok()))
            .unwrap_or_default()
    }
}

/// Builds [`LlmClient`]s from settings
pub struct ClientFactory;

impl ClientFactory {
    pub fn build(options: ClientOptions) -> Result<Arc<dyn LlmClient>> {
        let backend = options.backend;
        let api_key = options.resolved_key();
        let Some(url) = options.api_url.as_deref().or(backend.default_url()) else {
            bail!("{} backend requires an API URL, e.g. model@{}(http://localhost:8080)", backend, backend);
        };

        let client: Arc<dyn LlmClient> = if backend.is_openai_compatible() {
            Arc::new(
                OpenAiClient::new(api_key, options.model, chat_completions_url(url), options.agent_name)
                    .with_verbose(options.verbose),
            )
        } else {
            Arc::new(
                AnthropicLlmClient::new(api_key, options.model, url.to_string(), options.agent_name)
                    .with_verbose(options.verbose),
            )
        };
        log::debug!("{} client ready for {}", backend, client.model_name());
        Ok(client)
    }

    /// Build from a `model@backend(url)` setting. An empty model name means
    /// [`DEFAULT_MODEL`], and a missing backend means OpenAI.
    pub fn from_model_spec(
        setting: &str,
        api_key: Option<String>,
        agent_name: &str,
        verbose: bool,
    ) -> Result<Arc<dyn LlmClient>> {
        let spec = ModelSpec::parse(setting);
        let model = if spec.model.is_empty() { DEFAULT_MODEL } else { spec.model.as_str() };

        let mut options = ClientOptions::new(spec.backend_or_default(), model)
            .agent_name(agent_name)
            .verbose(verbose);
        options.api_key = api_key;
        options.api_url = spec.api_url.clone();
        Self::build(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llama_without_url_is_rejected() {
        let err = ClientFactory::build(ClientOptions::new(BackendType::Llama, "local")).err().unwrap();
        assert!(err.to_string().contains("requires an API URL"));
    }

    #[test]
    fn test_from_model_spec_defaults() {
        let client = ClientFactory::from_model_spec("@openai", Some("k".into()), "tester", false).unwrap();
        assert_eq!(client.model_name(), DEFAULT_MODEL);

        let client =
            ClientFactory::from_model_spec("qwen@llama(http://localhost:8080)", None, "tester", false).unwrap();
        assert_eq!(client.model_name(), "qwen");
    }
}
