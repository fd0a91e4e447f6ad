//! # agentdesk-llm-api
//!
//! One interface over the chat-completion and embedding providers the
//! agents talk to:
//! - OpenAI (and anything OpenAI-compatible: Groq, llama.cpp servers)
//! - Anthropic
//!
//! ## Example
//!
//! ```rust,no_run
//! use agentdesk_llm_api::{BackendType, ChatMessage, ClientFactory, ClientOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ClientFactory::build(
//!         ClientOptions::new(BackendType::OpenAI, "gpt-4o")
//!             .api_key("your-api-key")
//!             .agent_name("reviewer"),
//!     )?;
//!
//!     let reply = client.chat_completion(&[ChatMessage::user("Hello!")]).await?;
//!     println!("Response: {}", reply);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod embeddings;
pub mod testing;

pub use client::{
    ChatMessage, FunctionCall, LlmClient, LlmResponse, Role, TokenUsage, ToolCall, ToolCallKind,
    ToolDefinition,
};

pub use config::{
    chat_completions_url, BackendType, ClientFactory, ClientOptions, ModelSpec, ANTHROPIC_API_URL,
    DEFAULT_MODEL, GROQ_API_URL, OPENAI_API_URL,
};

pub use embeddings::{Embedder, HashingEmbedder, OpenAiEmbedder};
