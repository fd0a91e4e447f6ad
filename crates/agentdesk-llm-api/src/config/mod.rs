//! Model settings: which provider serves a model, and at what URL.
//!
//! A model is configured as `model`, `model@backend` or
//! `model@backend(api_url)`, e.g. `qwen2.5@llama(http://localhost:8080)`.

use anyhow::{anyhow, Error};
use std::fmt;
use std::str::FromStr;

pub mod factory;
pub use factory::{ClientFactory, ClientOptions};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Base URL only; the client appends `/v1/messages`
pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";

/// Model every agent uses unless configured otherwise
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    OpenAI,
    Groq,
    Anthropic,
    /// A llama.cpp server; there is no public default, so a URL is required
    Llama,
}

impl BackendType {
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Groq => "groq",
            Self::Anthropic => "anthropic",
            Self::Llama => "llama",
        }
    }

    pub fn default_url(self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some(OPENAI_API_URL),
            Self::Groq => Some(GROQ_API_URL),
            Self::Anthropic => Some(ANTHROPIC_API_URL),
            Self::Llama => None,
        }
    }

    /// Environment variable consulted when no key is passed explicitly
    pub fn key_env_var(self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Llama => None,
        }
    }

    /// Everything except Anthropic speaks the chat-completions protocol
    pub fn is_openai_compatible(self) -> bool {
        !matches!(self, Self::Anthropic)
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "groq" => Ok(Self::Groq),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "llama" | "llamacpp" | "llama.cpp" | "llama-cpp" => Ok(Self::Llama),
            other => Err(anyhow!("unknown backend '{}'", other)),
        }
    }
}

/// A parsed model setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub model: String,
    /// `None` when absent or unrecognised
    pub backend: Option<BackendType>,
    pub api_url: Option<String>,
}

impl ModelSpec {
    pub fn parse(setting: &str) -> Self {
        let (model, target) = setting.split_once('@').unwrap_or((setting, ""));
        let (backend, api_url) = match target.split_once('(') {
            Some((backend, url)) => (backend, Some(url.trim_end_matches(')'))),
            None => (target, None),
        };

        Self {
            model: model.trim().to_string(),
            backend: backend.parse().ok(),
            api_url: api_url.filter(|url| !url.is_empty()).map(str::to_string),
        }
    }

    pub fn backend_or_default(&self) -> BackendType {
        self.backend.unwrap_or(BackendType::OpenAI)
    }
}

/// Point a bare server URL at its chat-completions endpoint; full endpoints pass through
pub fn chat_completions_url(url: &str) -> String {
    if url.contains("/completions") || url.contains("/chat") {
        url.to_string()
    } else {
        format!("{}/v1/chat/completions", url.trim_end_matches('/'))
    }
}
