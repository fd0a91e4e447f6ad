//! Knowledge bases: document readers, chunking, vector stores and
//! retrieval with relevance re-scoring.

pub mod chunking;
pub mod documentation;
pub mod error;
pub mod knowledge_base;
pub mod processor;
pub mod reader;
pub mod relevance;
pub mod store;

pub use chunking::Chunker;
pub use documentation::{format_references, DocumentationAgent, KnowledgeStats, QueryMetadata, QueryResponse, StatsPayload};
pub use error::{KnowledgeError, KnowledgeResult};
pub use knowledge_base::{CombinedKnowledgeBase, CombinedSource, KnowledgeBase, KnowledgeSource};
pub use processor::{DocumentCounts, DocumentProcessor, PDF_TABLE, TEXT_TABLE};
pub use reader::{JsonReader, PdfReader, SelectorRule, TextReader, WebsiteReader};
pub use relevance::{query_terms, relevance_score, rescore, term_overlap};
pub use store::{
    validate_table_name, InMemoryVectorStore, PgVectorStore, SearchType, StoreBackend, VectorStore,
};
pub use knowledge_base::{JsonSource, PdfSource, TextSource, WebsiteSource};
