use thiserror::Error;

/// Errors shared across the agentdesk crates
#[derive(Debug, Error)]
pub enum AgentDeskError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("knowledge base error: {0}")]
    Knowledge(String),

    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    #[error("not initialized: {0}")]
    NotInitialized(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AgentDeskResult<T> = Result<T, AgentDeskError>;
