use thiserror::Error;

use agentdesk_knowledge::KnowledgeError;
use agentdesk_types::AgentDeskError;

#[derive(Debug, Error)]
pub enum CongressError {
    #[error("CONGRESS_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Congress.gov API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CongressError> for AgentDeskError {
    fn from(err: CongressError) -> Self {
        match err {
            CongressError::MissingApiKey => AgentDeskError::Config("CONGRESS_API_KEY is not set".to_string()),
            CongressError::Knowledge(e) => e.into(),
            CongressError::Io(e) => AgentDeskError::Io(e),
            CongressError::Json(e) => AgentDeskError::Json(e),
            other => AgentDeskError::Knowledge(other.to_string()),
        }
    }
}

pub type CongressResult<T> = Result<T, CongressError>;
