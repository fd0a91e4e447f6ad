use thiserror::Error;

use agentdesk_types::AgentDeskError;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("{documents} documents but {embeddings} embeddings")]
    EmbeddingMismatch { documents: usize, embeddings: usize },

    #[error("vector store unavailable: {0}")]
    Store(String),

    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),
}

impl KnowledgeError {
    pub fn read(path: impl std::fmt::Display, message: impl std::fmt::Display) -> Self {
        KnowledgeError::Read {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<KnowledgeError> for AgentDeskError {
    fn from(err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::InvalidTableName(name) => AgentDeskError::InvalidTableName(name),
            other => AgentDeskError::Knowledge(other.to_string()),
        }
    }
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
