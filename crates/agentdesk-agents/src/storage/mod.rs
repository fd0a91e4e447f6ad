use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agentdesk_llm_api::ChatMessage;

pub mod json_file;
pub mod postgres;

pub use json_file::JsonFileStorage;
pub use postgres::PgAgentStorage;

/// Persisted conversation of one agent session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSession {
    pub session_id: String,
    pub agent_name: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentSession {
    pub fn new(session_id: &str, agent_name: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            agent_name: agent_name.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append one user/assistant exchange and bump `updated_at`
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(assistant));
        self.updated_at = Utc::now();
    }
}

/// Where agents keep their sessions between runs
#[async_trait]
pub trait AgentStorage: Send + Sync {
    /// Prepare the backing store; calling it twice is harmless
    async fn create(&self) -> Result<()>;

    async fn read(&self, session_id: &str) -> Result<Option<AgentSession>>;

    async fn upsert(&self, session: &AgentSession) -> Result<()>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Known session ids, sorted
    async fn session_ids(&self) -> Result<Vec<String>>;
}

/// Session ids end up in file names and SQL parameters; keep them plain
pub(crate) fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(anyhow!("Invalid session id: {:?}", session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids() {
        assert!(validate_session_id("web_agent-01").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("../etc/passwd").is_err());
        assert!(validate_session_id("a b").is_err());
    }

    #[test]
    fn test_record_exchange() {
        let mut session = AgentSession::new("s1", "helper");
        let created = session.created_at;
        session.record_exchange("hi", "hello");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, "user");
        assert_eq!(session.messages[1].content, "hello");
        assert!(session.updated_at >= created);
    }
}
