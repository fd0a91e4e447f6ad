//! Core types and structures for agentdesk
//!
//! This crate provides the foundational types used across all agentdesk crates.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod error;
pub mod run;
pub mod task;

pub use error::{AgentDeskError, AgentDeskResult};
pub use run::{RunEvent, RunResponse};
pub use task::{TaskDefinition, TaskPriority, TaskResult, TaskType, QualityThresholds};

// ============================================================================
// Constants
// ============================================================================

/// Default PostgreSQL connection string for the pgvector instance
pub const DEFAULT_DB_URL: &str = "postgresql://ai:ai@localhost:5532/ai";

/// Schema holding every vector table
pub const VECTOR_SCHEMA: &str = "ai";

/// Default chunk size (characters) for document readers
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap (characters) between consecutive chunks
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Maximum number of knowledge sources handed to an answer
pub const MAX_SOURCES: usize = 5;

/// Hard upper bound for iterative refinement workflows
pub const MAX_WORKFLOW_ITERATIONS: usize = 20;

/// Marker a QA agent emits when the project documentation is complete
pub const NO_GAPS_MARKER: &str = "NO_GAPS_FOUND";

/// Prefix a QA agent uses to report an open gap
pub const GAP_MARKER: &str = "GAP:";

// ============================================================================
// Documents
// ============================================================================

/// `meta_data` key naming the source a chunk was cut from
pub const SOURCE_ID_KEY: &str = "source_id";

/// A chunk of text stored in a knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub meta_data: serde_json::Map<String, serde_json::Value>,
    pub content_hash: String,
}

impl Document {
    /// Create a document; the id is derived from the name, the hash from the content
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let content = content.into();
        Self {
            id: name.clone(),
            content_hash: content_hash(&content),
            name,
            content,
            meta_data: serde_json::Map::new(),
        }
    }

    /// Create the `index`-th chunk of the source document identified by `source_id`.
    /// The chunk id is `{source_id}_{n}` with `n` counting from 1.
    pub fn chunk(source_id: &str, name: &str, index: usize, content: impl Into<String>) -> Self {
        let mut doc = Self::new(name, content);
        doc.id = format!("{}_{}", source_id, index + 1);
        doc.meta_data
            .insert("chunk".to_string(), serde_json::Value::from(index + 1));
        doc.meta_data
            .insert(SOURCE_ID_KEY.to_string(), serde_json::Value::from(source_id));
        doc
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Id of the file or page this document came from; an unchunked document is its own source
    pub fn source_id(&self) -> &str {
        self.meta_data
            .get(SOURCE_ID_KEY)
            .and_then(|v| v.as_str())
            .unwrap_or(&self.id)
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.meta_data.insert(key.to_string(), value.into());
        self
    }

    /// Merge the fields of a source description into `meta_data`; existing keys win
    pub fn with_metadata(mut self, metadata: &DocumentMetadata) -> Self {
        if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(metadata) {
            for (key, value) in fields {
                if value.is_null() {
                    continue;
                }
                self.meta_data.entry(key).or_insert(value);
            }
        }
        self
    }
}

/// Hex-encoded SHA-256 of the document content, used for upsert de-duplication
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Metadata describing a source document in the knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    /// Type of document (pdf, text, url, json)
    pub source_type: String,
    pub source_path: String,
    #[serde(default = "chrono::Utc::now")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "active".to_string()
}

impl DocumentMetadata {
    pub fn new(title: &str, source_type: &str, source_path: &str) -> Self {
        Self {
            title: title.to_string(),
            source_type: source_type.to_string(),
            source_path: source_path.to_string(),
            created_at: chrono::Utc::now(),
            updated_at: None,
            tags: Vec::new(),
            category: None,
            version: None,
            author: None,
            department: None,
            status: default_status(),
        }
    }
}

/// A search hit with both the raw store score and the blended relevance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    /// Raw similarity reported by the vector store, clamped to 0..=1
    pub similarity: f32,
    /// Blended relevance in 0..=1
    pub relevance: f32,
}

impl SearchResult {
    pub fn new(document: Document, similarity: f32) -> Self {
        let similarity = similarity.clamp(0.0, 1.0);
        Self {
            document,
            similarity,
            relevance: similarity,
        }
    }
}

// ============================================================================
// Status envelope
// ============================================================================

/// `{"status": "success", ...}` / `{"status": "error", "message": ...}` envelope
/// returned by the knowledge and document operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusResponse<T> {
    Success(T),
    Error { message: String },
}

impl<T> StatusResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        StatusResponse::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StatusResponse::Success(_))
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            StatusResponse::Success(value) => Ok(value),
            StatusResponse::Error { message } => Err(message),
        }
    }
}

/// Payload carrying a single human-readable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}

impl StatusResponse<MessagePayload> {
    pub fn ok_message(message: impl Into<String>) -> Self {
        StatusResponse::Success(MessagePayload {
            message: message.into(),
        })
    }

    /// Message text regardless of outcome
    pub fn message(&self) -> &str {
        match self {
            StatusResponse::Success(payload) => &payload.message,
            StatusResponse::Error { message } => message,
        }
    }
}
