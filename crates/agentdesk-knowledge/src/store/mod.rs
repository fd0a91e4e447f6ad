//! Vector stores holding embedded documents

pub mod memory;
pub mod pgvector;

pub use memory::InMemoryVectorStore;
pub use pgvector::PgVectorStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agentdesk_types::{Document, SearchResult};

use crate::error::{KnowledgeError, KnowledgeResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Cosine similarity between embeddings
    #[default]
    Vector,
    /// Full-text rank of the query against the content
    Keyword,
    /// Mean of the normalised vector and keyword scores
    Hybrid,
}

impl SearchType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "vector" => Some(Self::Vector),
            "keyword" => Some(Self::Keyword),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

/// Storage seam for one knowledge-base table
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn table_name(&self) -> &str;

    async fn create(&self) -> KnowledgeResult<()>;

    async fn exists(&self) -> KnowledgeResult<bool>;

    async fn drop_table(&self) -> KnowledgeResult<()>;

    async fn delete_all(&self) -> KnowledgeResult<()>;

    /// Remove every row cut from the source `source_id`; returns the number removed
    async fn delete_source(&self, source_id: &str) -> KnowledgeResult<usize>;

    /// Insert documents, skipping ids that are already stored
    async fn insert(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> KnowledgeResult<usize>;

    /// Insert documents, replacing rows with the same id
    async fn upsert(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> KnowledgeResult<usize>;

    /// Raw hits with `similarity` in 0..=1; relevance is filled in by the caller
    async fn search(
        &self,
        query_embedding: &[f32],
        query_text: &str,
        limit: usize,
        search_type: SearchType,
    ) -> KnowledgeResult<Vec<SearchResult>>;

    async fn count(&self) -> KnowledgeResult<usize>;

    /// Whether a document with this content hash is stored
    async fn doc_exists(&self, content_hash: &str) -> KnowledgeResult<bool>;
}

/// Table names are interpolated into SQL and must be plain identifiers
pub fn validate_table_name(name: &str) -> KnowledgeResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= 63 {
        Ok(())
    } else {
        Err(KnowledgeError::InvalidTableName(name.to_string()))
    }
}

pub(crate) fn check_lengths(documents: &[Document], embeddings: &[Vec<f32>]) -> KnowledgeResult<()> {
    if documents.len() != embeddings.len() {
        return Err(KnowledgeError::EmbeddingMismatch {
            documents: documents.len(),
            embeddings: embeddings.len(),
        });
    }
    Ok(())
}

/// Where knowledge-base tables live
#[derive(Clone)]
pub enum StoreBackend {
    Postgres {
        pool: sqlx::PgPool,
        dimensions: usize,
    },
    /// Process-local tables; the same name always yields the same store
    Memory(Arc<Mutex<HashMap<String, Arc<InMemoryVectorStore>>>>),
}

impl StoreBackend {
    /// Connect lazily to PostgreSQL; nothing is sent until the first query
    pub fn postgres(db_url: &str, dimensions: usize) -> KnowledgeResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(db_url)?;
        Ok(StoreBackend::Postgres { pool, dimensions })
    }

    pub fn memory() -> Self {
        StoreBackend::Memory(Arc::new(Mutex::new(HashMap::new())))
    }

    pub fn open(&self, table: &str) -> KnowledgeResult<Arc<dyn VectorStore>> {
        validate_table_name(table)?;
        match self {
            StoreBackend::Postgres { pool, dimensions } => {
                Ok(Arc::new(PgVectorStore::new(pool.clone(), table, *dimensions)?))
            }
            StoreBackend::Memory(tables) => {
                let mut tables = tables
                    .lock()
                    .map_err(|_| KnowledgeError::Store("memory catalog lock poisoned".to_string()))?;
                let store = tables
                    .entry(table.to_string())
                    .or_insert_with(|| Arc::new(InMemoryVectorStore::new(table)))
                    .clone();
                Ok(store)
            }
        }
    }

    pub fn pool(&self) -> Option<&sqlx::PgPool> {
        match self {
            StoreBackend::Postgres { pool, .. } => Some(pool),
            StoreBackend::Memory(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("knowledge_base").is_ok());
        assert!(validate_table_name("_t1").is_ok());
        assert!(validate_table_name("1table").is_err());
        assert!(validate_table_name("drop table; --").is_err());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_memory_backend_shares_tables() {
        let backend = StoreBackend::memory();
        let a = backend.open("pdf_documents").unwrap();
        let b = backend.open("pdf_documents").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(backend.open("bad-name").is_err());
    }

    #[test]
    fn test_search_type_parse() {
        assert_eq!(SearchType::from_str("Hybrid"), Some(SearchType::Hybrid));
        assert_eq!(SearchType::from_str("other"), None);
    }
}
