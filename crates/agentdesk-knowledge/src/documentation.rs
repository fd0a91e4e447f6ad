use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use agentdesk_llm_api::{ChatMessage, Embedder, LlmClient};
use agentdesk_types::{SearchResult, StatusResponse, MAX_SOURCES};

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::knowledge_base::{CombinedKnowledgeBase, KnowledgeBase, KnowledgeSource, PdfSource, TextSource};
use crate::processor::{PDF_TABLE, TEXT_TABLE};
use crate::reader::{PdfReader, TextReader};
use crate::store::{SearchType, StoreBackend};

/// Number of candidates pulled from the combined table before picking sources
const CANDIDATE_DOCUMENTS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a documentation assistant with access to a knowledge base of documentation.
IMPORTANT: You MUST use the provided knowledge base to answer questions.

When answering:
1. ONLY use information from the provided knowledge base documents
2. ALWAYS cite the specific documents you reference
3. If you can't find relevant information in the knowledge base, say so clearly
4. DO NOT make assumptions or add information not present in the documents

For each response:
- Start by searching the knowledge base
- Quote relevant sections directly when possible
- Include document references
- If information is missing or unclear, say \"I cannot find specific information about this in the documentation\"

Remember: Your responses must be based SOLELY on the provided documentation.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub sources: Vec<SearchResult>,
    pub total_relevant_docs: usize,
    pub used_docs: usize,
    pub has_sources: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub metadata: QueryMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub total_documents: usize,
    pub pdf_documents: usize,
    pub text_documents: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    pub stats: KnowledgeStats,
}

/// Render hits as a numbered reference block for a prompt
pub fn format_references(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "[{}] {} (relevance {:.2})\n{}",
                i + 1,
                result.document.name,
                result.relevance,
                result.document.content.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Answers questions from the PDF and text documentation with retrieval-augmented prompting
pub struct DocumentationAgent {
    pdf_knowledge: KnowledgeBase,
    text_knowledge: KnowledgeBase,
    knowledge: CombinedKnowledgeBase,
    llm: Arc<dyn LlmClient>,
}

impl DocumentationAgent {
    /// Build the three knowledge bases over `data_dir/{pdfs,text}`; creates the
    /// directories but loads nothing
    pub async fn new(
        backend: &StoreBackend,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmClient>,
        data_dir: &Path,
        combined_table: &str,
        search_type: SearchType,
    ) -> KnowledgeResult<Self> {
        let pdf_dir = data_dir.join("pdfs");
        let text_dir = data_dir.join("text");
        tokio::fs::create_dir_all(&pdf_dir).await?;
        tokio::fs::create_dir_all(&text_dir).await?;

        let pdf_source: Arc<dyn KnowledgeSource> = Arc::new(PdfSource {
            path: pdf_dir,
            reader: PdfReader::default(),
        });
        let text_source: Arc<dyn KnowledgeSource> = Arc::new(TextSource {
            path: text_dir,
            reader: TextReader::default(),
        });

        let pdf_knowledge = KnowledgeBase::new(pdf_source.clone(), backend.open(PDF_TABLE)?, embedder.clone());
        let text_knowledge = KnowledgeBase::new(text_source.clone(), backend.open(TEXT_TABLE)?, embedder.clone());
        let knowledge = CombinedKnowledgeBase::new(
            vec![pdf_source, text_source],
            backend.open(combined_table)?,
            embedder,
        )
        .with_num_documents(CANDIDATE_DOCUMENTS)
        .with_search_type(search_type);

        Ok(Self {
            pdf_knowledge,
            text_knowledge,
            knowledge,
            llm,
        })
    }

    /// Load the PDF, text and combined knowledge bases
    pub async fn load(&self, recreate: bool) -> KnowledgeResult<usize> {
        let pdf = self.pdf_knowledge.load(recreate, false).await?;
        let text = self.text_knowledge.load(recreate, false).await?;
        let combined = self.knowledge.load(recreate, false).await?;
        log::info!(
            "documentation loaded: {} pdf, {} text, {} combined chunks",
            pdf,
            text,
            combined
        );
        Ok(pdf + text + combined)
    }

    pub fn system_prompt() -> &'static str {
        SYSTEM_PROMPT
    }

    async fn answer(&self, question: &str) -> KnowledgeResult<QueryResponse> {
        let relevant_docs = self.knowledge.search(question).await?;
        log::info!("found {} potentially relevant documents", relevant_docs.len());

        let sources: Vec<SearchResult> = relevant_docs.iter().take(MAX_SOURCES).cloned().collect();
        let user_message = if sources.is_empty() {
            format!(
                "No documents in the knowledge base matched this question.\n\nQuestion: {}",
                question
            )
        } else {
            format!(
                "Use the following references from the knowledge base:\n\n{}\n\nQuestion: {}",
                format_references(&sources),
                question
            )
        };

        let response = self
            .llm
            .chat_completion(&[ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_message)])
            .await
            .map_err(|e| KnowledgeError::Llm(e.to_string()))?;

        Ok(QueryResponse {
            response,
            metadata: QueryMetadata {
                total_relevant_docs: relevant_docs.len(),
                used_docs: sources.len(),
                has_sources: !sources.is_empty(),
                sources,
            },
        })
    }

    pub async fn query(&self, question: &str) -> StatusResponse<QueryResponse> {
        log::info!("processing query: {}", question);
        match self.answer(question).await {
            Ok(response) => StatusResponse::Success(response),
            Err(e) => {
                log::error!("error processing query: {}", e);
                StatusResponse::error(format!("Failed to process documentation query: {}", e))
            }
        }
    }

    pub async fn get_stats(&self) -> StatusResponse<StatsPayload> {
        let stats = async {
            let pdf_documents = self.pdf_knowledge.count().await?;
            let text_documents = self.text_knowledge.count().await?;
            KnowledgeResult::Ok(KnowledgeStats {
                total_documents: pdf_documents + text_documents,
                pdf_documents,
                text_documents,
            })
        }
        .await;

        match stats {
            Ok(stats) => StatusResponse::Success(StatsPayload { stats }),
            Err(e) => StatusResponse::error(format!("Failed to get statistics: {}", e)),
        }
    }
}
